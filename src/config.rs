use std::path::Path;

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};

/// 单个 LLM 端点配置（兼容 OpenAI API）
#[derive(Clone, Debug, Deserialize)]
pub struct ModelEndpoint {
    pub api_key: String,
    pub api_base_url: String,
    pub model_name: String,
}

impl ModelEndpoint {
    fn new(api_base_url: &str, model_name: &str) -> Self {
        Self {
            api_key: String::new(),
            api_base_url: api_base_url.to_string(),
            model_name: model_name.to_string(),
        }
    }

    fn override_from_env(&mut self, prefix: &str) {
        if let Ok(v) = std::env::var(format!("{prefix}_API_KEY")) {
            self.api_key = v;
        }
        if let Ok(v) = std::env::var(format!("{prefix}_API_BASE_URL")) {
            self.api_base_url = v;
        }
        if let Ok(v) = std::env::var(format!("{prefix}_MODEL_NAME")) {
            self.model_name = v;
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 三个评分模型 ---
    pub gemini: ModelEndpoint,
    pub openai: ModelEndpoint,
    pub anthropic: ModelEndpoint,
    /// 分割作文边界用的模型（走 gemini 端点）
    pub splitter_model: String,
    /// OCR 用的视觉模型（走 gemini 端点）
    pub ocr_model: String,
    /// 单次 LLM 调用超时（秒）
    pub request_timeout_secs: u64,
    pub max_completion_tokens: u32,
    // --- 输入输出 ---
    /// 待批改文件目录（pdf/png/jpg/jpeg/zip）
    pub input_folder: String,
    /// 评分标准 xlsx 路径
    pub rubric_path: String,
    /// 报告输出路径
    pub report_path: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 认证 ---
    pub password_hash: String,
    #[serde(skip)]
    pub password: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini: ModelEndpoint::new(
                "https://generativelanguage.googleapis.com/v1beta/openai",
                "gemini-3-flash",
            ),
            openai: ModelEndpoint::new("https://api.openai.com/v1", "gpt-5.2"),
            anthropic: ModelEndpoint::new("https://api.anthropic.com/v1", "claude-sonnet-4-6"),
            splitter_model: "gemini-3.1-pro-preview".to_string(),
            ocr_model: "gemini-3-pro-image".to_string(),
            request_timeout_secs: 1800,
            max_completion_tokens: 4096,
            input_folder: "uploads".to_string(),
            rubric_path: "rubric.xlsx".to_string(),
            report_path: "report.xlsx".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            password_hash: String::new(),
            password: String::new(),
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（可选） → 环境变量
    pub fn load() -> AppResult<Self> {
        let _ = dotenvy::dotenv();

        let path = std::env::var("GRADER_CONFIG").unwrap_or_else(|_| "grader.toml".to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };

        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件读取配置，缺省字段取默认值
    pub fn from_toml_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| {
            ConfigError::TomlParseFailed {
                path: path.to_string(),
                source,
            }
            .into()
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(mut self) -> Self {
        self.gemini.override_from_env("GEMINI");
        self.openai.override_from_env("OPENAI");
        self.anthropic.override_from_env("ANTHROPIC");

        env_string("SPLITTER_MODEL", &mut self.splitter_model);
        env_string("OCR_MODEL", &mut self.ocr_model);
        env_parsed("REQUEST_TIMEOUT_SECS", &mut self.request_timeout_secs);
        env_parsed("MAX_COMPLETION_TOKENS", &mut self.max_completion_tokens);
        env_string("INPUT_FOLDER", &mut self.input_folder);
        env_string("RUBRIC_PATH", &mut self.rubric_path);
        env_string("REPORT_PATH", &mut self.report_path);
        env_string("OUTPUT_LOG_FILE", &mut self.output_log_file);
        env_parsed("VERBOSE_LOGGING", &mut self.verbose_logging);
        env_string("APP_PASSWORD_HASH", &mut self.password_hash);
        env_string("APP_PASSWORD", &mut self.password);
        self
    }

    /// 检查三个评分模型的 API key 是否都已配置
    pub fn ensure_api_keys(&self) -> AppResult<()> {
        for (name, endpoint) in [
            ("GEMINI_API_KEY", &self.gemini),
            ("OPENAI_API_KEY", &self.openai),
            ("ANTHROPIC_API_KEY", &self.anthropic),
        ] {
            if endpoint.api_key.is_empty() {
                return Err(ConfigError::Missing {
                    name: name.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

fn env_string(name: &str, target: &mut String) {
    if let Ok(v) = std::env::var(name) {
        *target = v;
    }
}

// 无法解析的值保留原值
fn env_parsed<T: std::str::FromStr>(name: &str, target: &mut T) {
    if let Some(v) = std::env::var(name).ok().and_then(|v| v.parse().ok()) {
        *target = v;
    }
}
