//! # Essay Grader
//!
//! 手写作文扫描件的批量批改程序：OCR → 拆分 → 三模型评分 → 报告
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 持有外部资源（LLM 连接），只暴露能力
//! - `ChatBackend` - 所有 LLM 调用方依赖的接口，`LlmClient` 为 OpenAI 兼容实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个模块一种能力
//! - `OcrService` - 图片 / PDF 识别
//! - `BoundaryDetector` - 多名学生作文的页面分组
//! - `MultiModelCaller` + `EvaluationService` - 三模型并发评分与选优
//! - `file_intake` / `rubric_loader` / `report_writer` / `auth` - 输入输出
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义两条流水线
//! - `IntakeFlow` - OCR → 边界检测 → 提交物
//! - `GradingFlow` - 逐份批改，遇到全部失败即停止
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 一次完整运行，管理资源和统计
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ChatBackend, LlmClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{EvaluationResult, GradedSubmission, ModelEvaluation, ModelId, Page, Submission};
pub use orchestrator::{App, Backends, RunSummary};
pub use workflow::{GradingFailure, GradingFlow, IntakeFlow};
