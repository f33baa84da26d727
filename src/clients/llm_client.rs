//! LLM API 客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 三家服务（Gemini / OpenAI / Anthropic）都通过各自的 OpenAI 兼容端点访问
//! - 客户端在启动时构造一次，之后以 `Arc<dyn ChatBackend>` 共享

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::ModelEndpoint;
use crate::error::LlmError;

/// 所有 LLM 调用方依赖的能力接口
///
/// 返回 `Err` 即表示该次调用失败（包括超时和空响应），由调用方决定如何兜底。
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// 模型名称（仅用于日志）
    fn model_name(&self) -> &str;

    /// 发送一条用户消息，可附带图片 URL（支持 data URL）
    async fn send_to_llm(
        &self,
        user_message: &str,
        imgs: Option<&[String]>,
    ) -> Result<String, LlmError>;
}

/// LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    timeout: Duration,
    max_completion_tokens: u32,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(endpoint: &ModelEndpoint, timeout: Duration, max_completion_tokens: u32) -> Self {
        Self::with_model(endpoint, endpoint.model_name.clone(), timeout, max_completion_tokens)
    }

    /// 复用端点配置，换一个模型
    pub fn with_model(
        endpoint: &ModelEndpoint,
        model_name: impl Into<String>,
        timeout: Duration,
        max_completion_tokens: u32,
    ) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&endpoint.api_key)
            .with_api_base(&endpoint.api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: model_name.into(),
            timeout,
            max_completion_tokens,
        }
    }

    fn call_failed(&self, e: impl std::fmt::Display) -> LlmError {
        LlmError::ApiCallFailed {
            model: self.model_name.clone(),
            message: e.to_string(),
        }
    }

    fn build_user_message(
        &self,
        user_message: &str,
        imgs: Option<&[String]>,
    ) -> Result<ChatCompletionRequestMessage, LlmError> {
        let img_urls = imgs.unwrap_or_default();

        let user_msg = if img_urls.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
        } else {
            // Vision：图片在前，文本在后
            let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> =
                Vec::with_capacity(img_urls.len() + 1);

            for url in img_urls {
                content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: url.clone(),
                            detail: Some(ImageDetail::High),
                        },
                    },
                ));
            }
            content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: user_message.to_string(),
                },
            ));

            debug!("使用 Vision API，包含 {} 张图片", img_urls.len());

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
                .build()
        }
        .map_err(|e| self.call_failed(e))?;

        Ok(ChatCompletionRequestMessage::User(user_msg))
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn send_to_llm(
        &self,
        user_message: &str,
        imgs: Option<&[String]>,
    ) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let message = self.build_user_message(user_message, imgs)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![message])
            .max_completion_tokens(self.max_completion_tokens)
            .build()
            .map_err(|e| self.call_failed(e))?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                warn!("LLM API 调用超时: {}", self.model_name);
                LlmError::Timeout {
                    model: self.model_name.clone(),
                    seconds: self.timeout.as_secs(),
                }
            })?
            .map_err(|e| {
                warn!("LLM API 调用失败 ({}): {}", self.model_name, e);
                self.call_failed(e)
            })?;

        debug!("LLM API 调用成功");

        // 空内容与调用失败同等对待
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content)
    }
}
