//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次批量批改的调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (一次运行：评分标准 → 识别 → 批改 → 报告)
//!     ↓
//! workflow::IntakeFlow / GradingFlow
//!     ↓
//! services (能力层：ocr / boundary / evaluation / report ...)
//!     ↓
//! clients (LlmClient，经 ChatBackend 注入)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源集中**：只有编排层构造 LLM 客户端
//! 2. **向下依赖**：编排层 → workflow → services → clients
//! 3. **无业务逻辑**：只做调度和统计

pub mod batch_processor;

pub use batch_processor::{App, Backends, RunSummary};
