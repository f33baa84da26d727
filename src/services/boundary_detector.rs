//! 作文边界检测 - 业务能力层
//!
//! 一个文件里可能扫描了多名学生的作文，用一次 LLM 调用把页面分组。
//! 任何失败都退回到“所有页面为一组”，保证不丢页。

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clients::ChatBackend;
use crate::error::LlmError;
use crate::models::Page;
use crate::services::prompt_builder::build_boundary_prompt;
use crate::services::response_parser::extract_json_block;

/// 分组响应无效的原因
#[derive(Debug, Error, PartialEq)]
pub enum BoundaryError {
    #[error("响应为空")]
    Empty,
    #[error("JSON解析失败: {0}")]
    NotJson(String),
    #[error("顶层不是数组")]
    NotArray,
    #[error("第 {0} 组不是数组")]
    GroupNotArray(usize),
    #[error("第 {0} 组为空")]
    EmptyGroup(usize),
    #[error("存在非整数索引: {0}")]
    NotInteger(String),
    #[error("索引 {index} 超出范围 [0, {page_count})")]
    OutOfRange { index: u64, page_count: usize },
    #[error("索引 {0} 出现了多次")]
    Duplicate(usize),
    #[error("分组没有覆盖全部页面，缺少: {0:?}")]
    Incomplete(Vec<usize>),
    #[error("LLM 调用失败: {0}")]
    Llm(String),
}

impl From<LlmError> for BoundaryError {
    fn from(err: LlmError) -> Self {
        BoundaryError::Llm(err.to_string())
    }
}

/// 所有页面按原顺序归为一组
pub fn fallback_groups(page_count: usize) -> Vec<Vec<usize>> {
    vec![(0..page_count).collect()]
}

/// 解析并校验分组响应
///
/// 要求是整数二维数组，且恰好把 `0..page_count` 每个索引分配一次。
pub fn parse_boundary_response(
    response_text: &str,
    page_count: usize,
) -> Result<Vec<Vec<usize>>, BoundaryError> {
    if response_text.trim().is_empty() {
        return Err(BoundaryError::Empty);
    }

    let candidate = extract_json_block(response_text);
    let value: Value =
        serde_json::from_str(candidate).map_err(|e| BoundaryError::NotJson(e.to_string()))?;

    let raw_groups = value.as_array().ok_or(BoundaryError::NotArray)?;

    let mut seen = HashSet::with_capacity(page_count);
    let mut groups = Vec::with_capacity(raw_groups.len());

    for (group_index, raw_group) in raw_groups.iter().enumerate() {
        let items = raw_group
            .as_array()
            .ok_or(BoundaryError::GroupNotArray(group_index))?;
        if items.is_empty() {
            return Err(BoundaryError::EmptyGroup(group_index));
        }

        let mut group = Vec::with_capacity(items.len());
        for item in items {
            let index = item
                .as_u64()
                .ok_or_else(|| BoundaryError::NotInteger(item.to_string()))?;
            if index >= page_count as u64 {
                return Err(BoundaryError::OutOfRange { index, page_count });
            }
            let index = index as usize;
            if !seen.insert(index) {
                return Err(BoundaryError::Duplicate(index));
            }
            group.push(index);
        }
        groups.push(group);
    }

    if seen.len() != page_count {
        let missing = (0..page_count).filter(|i| !seen.contains(i)).collect();
        return Err(BoundaryError::Incomplete(missing));
    }

    Ok(groups)
}

/// 边界检测服务
pub struct BoundaryDetector {
    backend: Arc<dyn ChatBackend>,
}

impl BoundaryDetector {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// 调用 LLM 并解析，失败原因以 `Err` 返回
    pub async fn try_detect(&self, pages: &[Page]) -> Result<Vec<Vec<usize>>, BoundaryError> {
        let prompt = build_boundary_prompt(pages);
        debug!("边界检测，模型: {}, 页数: {}", self.backend.model_name(), pages.len());
        let response = self.backend.send_to_llm(&prompt, None).await?;
        parse_boundary_response(&response, pages.len())
    }

    /// 检测作文边界
    ///
    /// 不超过 1 页时直接返回单组，不调用 LLM；检测失败时退回单组。
    pub async fn detect_boundaries(&self, pages: &[Page]) -> Vec<Vec<usize>> {
        if pages.len() <= 1 {
            return fallback_groups(pages.len());
        }

        match self.try_detect(pages).await {
            Ok(groups) => {
                info!("✓ 检测到 {} 篇作文 (共 {} 页)", groups.len(), pages.len());
                groups
            }
            Err(e) => {
                warn!("⚠️ 边界检测失败，全部 {} 页视为一篇作文: {}", pages.len(), e);
                fallback_groups(pages.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedBackend {
        reply: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn send_to_llm(
            &self,
            _user_message: &str,
            _imgs: Option<&[String]>,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|_| LlmError::Timeout {
                model: "scripted".to_string(),
                seconds: 1800,
            })
        }
    }

    fn pages(n: usize) -> Vec<Page> {
        (0..n)
            .map(|i| Page::new(format!("1030{}", i), "", format!("page {}", i)))
            .collect()
    }

    #[test]
    fn test_valid_partition_is_kept_in_order() {
        assert_eq!(
            parse_boundary_response("[[0,1],[2]]", 3).unwrap(),
            vec![vec![0, 1], vec![2]]
        );
        assert_eq!(
            parse_boundary_response("```json\n[[2],[0,1]]\n```", 3).unwrap(),
            vec![vec![2], vec![0, 1]]
        );
    }

    #[test]
    fn test_invalid_responses_are_rejected() {
        let cases: [(&str, BoundaryError); 8] = [
            ("", BoundaryError::Empty),
            ("{\"groups\": []}", BoundaryError::NotArray),
            ("[[0,1],2]", BoundaryError::GroupNotArray(1)),
            ("[[0,1],[]]", BoundaryError::EmptyGroup(1)),
            ("[[0,1.5],[2]]", BoundaryError::NotInteger("1.5".to_string())),
            ("[[0,1],[3]]", BoundaryError::OutOfRange { index: 3, page_count: 3 }),
            ("[[0,1],[1,2]]", BoundaryError::Duplicate(1)),
            ("[[0],[2]]", BoundaryError::Incomplete(vec![1])),
        ];
        for (text, expected) in cases {
            assert_eq!(parse_boundary_response(text, 3).unwrap_err(), expected, "{}", text);
        }
        assert!(matches!(
            parse_boundary_response("[[0,1],[2]", 3),
            Err(BoundaryError::NotJson(_))
        ));
        assert!(matches!(
            parse_boundary_response("[[0,-1],[2]]", 3),
            Err(BoundaryError::NotInteger(_))
        ));
    }

    #[tokio::test]
    async fn test_single_page_never_calls_llm() {
        let backend = Arc::new(ScriptedBackend::replying("[[0],[1]]"));
        let detector = BoundaryDetector::new(backend.clone());

        assert_eq!(detector.detect_boundaries(&pages(1)).await, vec![vec![0]]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_detect_uses_llm_groups() {
        let backend = Arc::new(ScriptedBackend::replying("[[0,1],[2]]"));
        let detector = BoundaryDetector::new(backend.clone());

        let groups = detector.detect_boundaries(&pages(3)).await;
        assert_eq!(groups, vec![vec![0, 1], vec![2]]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_to_single_group() {
        let detector = BoundaryDetector::new(Arc::new(ScriptedBackend::failing()));
        assert_eq!(
            detector.detect_boundaries(&pages(4)).await,
            vec![vec![0, 1, 2, 3]]
        );
    }

    #[tokio::test]
    async fn test_invalid_response_falls_back_to_single_group() {
        let detector = BoundaryDetector::new(Arc::new(ScriptedBackend::replying(
            "두 명의 학생입니다: [[0],[1]]",
        )));
        assert_eq!(detector.detect_boundaries(&pages(3)).await, vec![vec![0, 1, 2]]);
    }
}
