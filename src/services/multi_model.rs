//! 多模型调用 - 业务能力层
//!
//! 同一个提示词并发发给三个模型，每个模型的失败互不影响。

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::clients::ChatBackend;
use crate::error::LlmError;
use crate::models::ModelId;

/// 单个模型的原始响应
#[derive(Debug)]
pub struct ModelReply {
    pub model: ModelId,
    pub raw: Result<String, LlmError>,
}

/// 多模型调用器
///
/// 后端顺序固定为 gemini → openai → anthropic，返回结果也按此顺序排列，
/// 与完成先后无关。
pub struct MultiModelCaller {
    backends: Vec<(ModelId, Arc<dyn ChatBackend>)>,
}

impl MultiModelCaller {
    pub fn new(
        gemini: Arc<dyn ChatBackend>,
        openai: Arc<dyn ChatBackend>,
        anthropic: Arc<dyn ChatBackend>,
    ) -> Self {
        Self {
            backends: vec![
                (ModelId::Gemini, gemini),
                (ModelId::OpenAi, openai),
                (ModelId::Anthropic, anthropic),
            ],
        }
    }

    /// 并发调用三个模型并收集结果
    ///
    /// 每个调用在独立任务中执行；出错、超时、空响应甚至 panic 都只记为该模型失败。
    pub async fn call_all(&self, prompt: &str) -> Vec<ModelReply> {
        let prompt: Arc<str> = Arc::from(prompt);

        let (models, handles): (Vec<ModelId>, Vec<_>) = self
            .backends
            .iter()
            .map(|(model, backend)| {
                let backend = Arc::clone(backend);
                let prompt = Arc::clone(&prompt);
                let handle =
                    tokio::spawn(async move { backend.send_to_llm(&prompt, None).await });
                (*model, handle)
            })
            .unzip();

        let joined = join_all(handles).await;

        let mut replies = Vec::with_capacity(joined.len());
        for (model, result) in models.into_iter().zip(joined) {
            let raw = match result {
                Ok(raw) => raw,
                Err(e) => Err(LlmError::ApiCallFailed {
                    model: model.to_string(),
                    message: format!("任务执行失败: {}", e),
                }),
            };

            match &raw {
                Ok(text) => debug!("[{}] 收到响应，长度 {} 字符", model, text.len()),
                Err(e) => warn!("[{}] ⚠️ 模型调用失败: {}", model, e),
            }

            replies.push(ModelReply { model, raw });
        }

        replies
    }
}
