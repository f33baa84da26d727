//! OCR 服务 - 业务能力层
//!
//! 图片以 base64 data URL 发给视觉模型；PDF 先逐页渲染再逐页识别。

use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine;
use tracing::{debug, info};

use crate::clients::ChatBackend;
use crate::error::{AppError, LlmError};
use crate::models::Page;
use crate::services::file_intake::extension_of;
use crate::services::pdf_renderer::render_pdf_pages;
use crate::services::prompt_builder::OCR_PROMPT;
use crate::services::response_parser::parse_ocr_response;

/// 按扩展名推断图片 MIME 类型
pub fn image_mime_type(file_name: &str) -> Option<&'static str> {
    match extension_of(file_name).as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

/// 构造 data URL
pub fn to_data_url(image_bytes: &[u8], mime_type: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(image_bytes)
    )
}

/// OCR 服务
pub struct OcrService {
    backend: Arc<dyn ChatBackend>,
}

impl OcrService {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// 识别一张图片
    ///
    /// 调用失败返回 `Err`；响应无法解析时原文保留为作文正文。
    pub async fn extract_page(&self, image_bytes: &[u8], mime_type: &str) -> Result<Page, LlmError> {
        let imgs = [to_data_url(image_bytes, mime_type)];
        let response = self.backend.send_to_llm(OCR_PROMPT, Some(&imgs[..])).await?;
        Ok(parse_ocr_response(&response))
    }

    /// 识别一个文件，每个物理页对应一个 `Page`
    pub async fn ocr_file(&self, file_name: &str, file_bytes: Vec<u8>) -> Result<Vec<Page>> {
        if extension_of(file_name) == "pdf" {
            let images = render_pdf_pages(file_bytes)
                .await
                .with_context(|| format!("PDF 转图片失败: {}", file_name))?;
            info!("📄 {} 共 {} 页", file_name, images.len());

            let mut pages = Vec::with_capacity(images.len());
            for (index, png) in images.iter().enumerate() {
                debug!("识别 {} 第 {} 页", file_name, index + 1);
                let page = self
                    .extract_page(png, "image/png")
                    .await
                    .with_context(|| format!("{} 第 {} 页 OCR 失败", file_name, index + 1))?;
                pages.push(page);
            }
            return Ok(pages);
        }

        let Some(mime_type) = image_mime_type(file_name) else {
            return Err(AppError::unsupported_format(file_name, extension_of(file_name)).into());
        };

        let page = self
            .extract_page(&file_bytes, mime_type)
            .await
            .with_context(|| format!("{} OCR 失败", file_name))?;
        Ok(vec![page])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntakeError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingBackend {
        reply: String,
        seen_images: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatBackend for RecordingBackend {
        fn model_name(&self) -> &str {
            "vision"
        }

        async fn send_to_llm(
            &self,
            user_message: &str,
            imgs: Option<&[String]>,
        ) -> Result<String, LlmError> {
            assert_eq!(user_message, OCR_PROMPT);
            let mut seen = self.seen_images.lock().unwrap();
            seen.extend(imgs.unwrap_or_default().iter().cloned());
            Ok(self.reply.clone())
        }
    }

    fn service(reply: &str) -> (Arc<RecordingBackend>, OcrService) {
        let backend = Arc::new(RecordingBackend {
            reply: reply.to_string(),
            seen_images: Mutex::new(Vec::new()),
        });
        (backend.clone(), OcrService::new(backend))
    }

    #[test]
    fn test_mime_and_data_url() {
        assert_eq!(image_mime_type("a.PNG"), Some("image/png"));
        assert_eq!(image_mime_type("a.jpeg"), Some("image/jpeg"));
        assert_eq!(image_mime_type("a.gif"), None);
        assert_eq!(to_data_url(b"abc", "image/png"), "data:image/png;base64,YWJj");
    }

    #[tokio::test]
    async fn test_image_file_yields_one_page() {
        let (backend, ocr) = service(
            r#"{"student_id": "10305", "student_name": "홍길동", "essay_text": "본문"}"#,
        );
        let pages = ocr.ocr_file("scan.jpg", b"jpeg-bytes".to_vec()).await.unwrap();

        assert_eq!(pages, vec![Page::new("10305", "홍길동", "본문")]);
        let seen = backend.seen_images.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_kept_as_raw_text() {
        let (_, ocr) = service("글씨를 알아볼 수 없습니다");
        let pages = ocr.ocr_file("scan.png", b"png".to_vec()).await.unwrap();
        assert_eq!(pages, vec![Page::raw("글씨를 알아볼 수 없습니다")]);
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_typed_error() {
        let (_, ocr) = service("{}");
        let err = ocr.ocr_file("essay.docx", Vec::new()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::Intake(IntakeError::UnsupportedFormat { .. }))
        ));
    }
}
