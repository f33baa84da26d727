//! 批量批改处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整批改的调度和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、密码校验、API key 检查、构造 LLM 客户端（只构造一次）
//! 2. **读取评分标准**：xlsx → 评分项 → 提示词文本
//! 3. **识别**：扫描输入目录 → 展开上传 → OCR → 边界检测 → 提交物
//! 4. **批改**：逐份三模型评分，遇到全部失败即停止
//! 5. **报告**：无论是否中断，都把已批改部分写入报告
//! 6. **全局统计**：汇总识别和批改结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单份提交物的细节
//! - **资源所有者**：唯一持有 LLM 客户端的模块，以 `Arc<dyn ChatBackend>` 向下注入
//! - **向下委托**：委托 workflow 处理识别与批改

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::clients::{ChatBackend, LlmClient};
use crate::config::Config;
use crate::models::{format_rubric, ModelId, RubricItem};
use crate::services::auth::authenticate;
use crate::services::file_intake::scan_input_folder;
use crate::services::prompt_builder::{build_boundary_prompt, build_evaluation_prompt, OCR_PROMPT};
use crate::services::report_writer::save_report;
use crate::services::rubric_loader::load_rubric;
use crate::services::submission_builder::format_submissions_for_display;
use crate::services::{BoundaryDetector, EvaluationService, MultiModelCaller, OcrService};
use crate::utils::logging::{self, log_stage, log_startup, print_final_stats};
use crate::workflow::{expand_uploads, FailedFile, GradingFailure, GradingFlow, IntakeFlow};

/// 所有 LLM 后端（编排层统一持有）
pub struct Backends {
    pub ocr: Arc<dyn ChatBackend>,
    pub splitter: Arc<dyn ChatBackend>,
    pub gemini: Arc<dyn ChatBackend>,
    pub openai: Arc<dyn ChatBackend>,
    pub anthropic: Arc<dyn ChatBackend>,
}

impl Backends {
    /// 根据配置构造全部客户端；OCR 和边界检测复用 gemini 端点
    pub fn from_config(config: &Config) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let max_tokens = config.max_completion_tokens;

        Self {
            ocr: Arc::new(LlmClient::with_model(
                &config.gemini,
                &config.ocr_model,
                timeout,
                max_tokens,
            )),
            splitter: Arc::new(LlmClient::with_model(
                &config.gemini,
                &config.splitter_model,
                timeout,
                max_tokens,
            )),
            gemini: Arc::new(LlmClient::new(&config.gemini, timeout, max_tokens)),
            openai: Arc::new(LlmClient::new(&config.openai, timeout, max_tokens)),
            anthropic: Arc::new(LlmClient::new(&config.anthropic, timeout, max_tokens)),
        }
    }
}

/// 一次运行的汇总
#[derive(Debug, Default)]
pub struct RunSummary {
    /// 识别出的提交物数
    pub total: usize,
    pub graded: usize,
    pub unidentified: Vec<String>,
    pub failed_files: Vec<FailedFile>,
    pub failure: Option<GradingFailure>,
}

/// 应用主结构
pub struct App {
    config: Config,
    intake: IntakeFlow,
    grading: GradingFlow,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)
            .with_context(|| format!("无法创建日志文件: {}", config.output_log_file))?;

        authenticate(&config.password, &config.password_hash)?;
        info!("🔐 密码校验通过");

        config.ensure_api_keys()?;

        let backends = Backends::from_config(&config);
        log_startup(
            &config.input_folder,
            &[
                config.gemini.model_name.as_str(),
                config.openai.model_name.as_str(),
                config.anthropic.model_name.as_str(),
            ],
        );

        Ok(Self::with_backends(config, backends))
    }

    /// 用给定的后端组装应用（不做认证和 key 检查）
    pub fn with_backends(config: Config, backends: Backends) -> Self {
        let intake = IntakeFlow::new(
            OcrService::new(backends.ocr),
            BoundaryDetector::new(backends.splitter),
        );
        let caller = MultiModelCaller::new(backends.gemini, backends.openai, backends.anthropic);
        let grading = GradingFlow::new(EvaluationService::new(caller), config.verbose_logging);

        Self {
            config,
            intake,
            grading,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary> {
        let rubric = self.load_rubric().await?;
        self.run_with_rubric(&rubric).await
    }

    /// 读取评分标准
    async fn load_rubric(&self) -> Result<Vec<RubricItem>> {
        log_stage("读取评分标准");
        let bytes = tokio::fs::read(&self.config.rubric_path)
            .await
            .with_context(|| format!("无法读取评分标准: {}", self.config.rubric_path))?;
        let rubric = load_rubric(&bytes)?;
        info!("✓ 评分标准共 {} 项", rubric.len());
        Ok(rubric)
    }

    /// 使用已解析的评分标准运行识别、批改和报告
    pub async fn run_with_rubric(&self, rubric: &[RubricItem]) -> Result<RunSummary> {
        let rubric_text = format_rubric(rubric);
        if self.config.verbose_logging {
            self.log_prompt_catalogue(&rubric_text);
        }

        // ========== 识别 ==========
        log_stage("识别提交物");
        let uploads = scan_input_folder(&self.config.input_folder).await?;
        let (files, mut failed_files) = expand_uploads(uploads);

        if files.is_empty() {
            warn!("⚠️ 没有找到可处理的文件，程序结束");
        }

        let intake = self.intake.run_ocr_and_identify(files).await;
        failed_files.extend(intake.failed_files);

        if !intake.submissions.is_empty() {
            info!(
                "识别结果:\n{}",
                format_submissions_for_display(&intake.submissions)
            );
        }

        // ========== 批改 ==========
        log_stage("批改");
        let total = intake.submissions.len();
        let outcome = self
            .grading
            .grade_submissions(intake.submissions, &rubric_text)
            .await;

        // ========== 报告 ==========
        save_report(&self.config.report_path, &outcome.graded).await?;
        if let Some(failure) = &outcome.failure {
            error!("❌ {}", failure);
        }

        print_final_stats(
            outcome.graded.len(),
            total,
            intake.unidentified.len(),
            failed_files.len(),
            &self.config.report_path,
            &self.config.output_log_file,
        );
        for failed in &failed_files {
            warn!("⚠️ 未处理的文件: {} ({})", failed.name, failed.reason);
        }

        Ok(RunSummary {
            total,
            graded: outcome.graded.len(),
            unidentified: intake.unidentified,
            failed_files,
            failure: outcome.failure,
        })
    }

    // ========== 日志辅助方法 ==========

    /// 详细模式下展示三类提示词
    fn log_prompt_catalogue(&self, rubric_text: &str) {
        info!("📝 OCR 提示词:\n{}", OCR_PROMPT);
        info!(
            "📝 评分提示词 (模型: {}):\n{}",
            ModelId::ALL.map(|m| m.as_str()).join(", "),
            build_evaluation_prompt(rubric_text, "{essay}")
        );
        info!("📝 边界检测提示词 (示例):\n{}", build_boundary_prompt(&[]));
    }
}
