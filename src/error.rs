use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 上传文件相关错误
    #[error("文件错误: {0}")]
    Intake(#[from] IntakeError),
    /// 评分标准表错误
    #[error("评分标准错误: {0}")]
    Rubric(#[from] RubricError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 认证错误
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 上传文件错误
#[derive(Debug, Error)]
pub enum IntakeError {
    /// 不支持的文件扩展名
    #[error("不支持的文件格式: {extension} ({file_name})")]
    UnsupportedFormat { file_name: String, extension: String },
    /// ZIP 中包含目录
    #[error("ZIP 文件 {file_name} 中包含目录 ({entry})，请上传只包含文件的 ZIP")]
    ZipContainsDirectory { file_name: String, entry: String },
    /// ZIP 无法读取
    #[error("无法读取 ZIP 文件 {file_name}: {source}")]
    ZipUnreadable {
        file_name: String,
        #[source]
        source: zip::result::ZipError,
    },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 评分标准表错误
#[derive(Debug, Error, PartialEq)]
pub enum RubricError {
    /// 不是有效的 xlsx
    #[error("不是有效的 xlsx 文件: {0}")]
    Unreadable(String),
    /// 工作表为空
    #[error("文件中没有数据")]
    EmptySheet,
    /// 表头不匹配
    #[error("表头不正确。需要: {expected:?}, 实际: {actual:?}")]
    BadHeader {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    /// 没有数据行
    #[error("至少需要 1 行数据")]
    NoDataRows,
    /// 分值不是数字
    #[error("第 {row} 行的 {field} 不是数字: {value}")]
    NonNumericScore {
        row: usize,
        field: &'static str,
        value: String,
    },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
    /// 超时
    #[error("LLM API调用超时 (模型: {model}, {seconds} 秒)")]
    Timeout { model: String, seconds: u64 },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 认证错误
#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    /// 未配置密码哈希
    #[error("未配置 APP_PASSWORD_HASH")]
    HashNotConfigured,
    /// 密码不正确
    #[error("密码不正确")]
    WrongPassword,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 必填项缺失
    #[error("缺少必要配置项: {name}")]
    Missing { name: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建不支持格式错误
    pub fn unsupported_format(file_name: impl Into<String>, extension: impl Into<String>) -> Self {
        AppError::Intake(IntakeError::UnsupportedFormat {
            file_name: file_name.into(),
            extension: extension.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_numeric_score_names_row_and_field() {
        let err = RubricError::NonNumericScore {
            row: 2,
            field: "max_score",
            value: "abc".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("第 2 行"));
        assert!(msg.contains("max_score"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_app_error_wraps_sub_errors() {
        let err: AppError = AuthError::WrongPassword.into();
        assert!(matches!(err, AppError::Auth(AuthError::WrongPassword)));
        assert!(err.to_string().starts_with("认证错误"));
    }
}
