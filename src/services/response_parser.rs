//! LLM 响应解析 - 业务能力层
//!
//! 负责从模型的自由文本中提取 JSON，并校验为强类型结构：
//! - 评分响应 → `ModelEvaluation`
//! - OCR 响应 → `Page`（失败时原文整体保留为作文正文）

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::models::{ModelEvaluation, Page};

/// 解析失败原因
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("响应为空")]
    Empty,
    #[error("JSON解析失败: {0}")]
    NotJson(#[source] serde_json::Error),
    #[error("顶层不是 JSON 对象")]
    NotObject,
    #[error("scores 第 {0} 项不是 JSON 对象")]
    ScoreNotObject(usize),
    #[error("JSON结构不符合要求: {0}")]
    InvalidShape(#[source] serde_json::Error),
}

fn code_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)\n?\s*```").expect("code fence regex")
    })
}

/// 提取第一个 markdown 代码块的内容；没有代码块时返回去除首尾空白的全文
pub fn extract_json_block(text: &str) -> &str {
    let trimmed = text.trim();
    code_fence_regex()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed)
}

/// 解析评分响应
///
/// 要求顶层为对象且包含 `scores`（数组，每项都有整数 `item_number` 和数值 `score`）
/// 与字符串 `feedback`，多余字段忽略。
pub fn parse_evaluation_response(response_text: &str) -> Result<ModelEvaluation, ParseError> {
    if response_text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let candidate = extract_json_block(response_text);
    let value: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => embedded_object(candidate)
            .and_then(|slice| serde_json::from_str(slice).ok())
            .ok_or(ParseError::NotJson(e))?,
    };

    ensure_score_objects(&value)?;
    decode_object(value)
}

// `ScoreItem` 同样能从 `[1, 3]` 这样的数组反序列化，逐项检查
fn ensure_score_objects(value: &Value) -> Result<(), ParseError> {
    let Some(scores) = value.get("scores").and_then(Value::as_array) else {
        return Ok(());
    };
    match scores.iter().position(|item| !item.is_object()) {
        Some(index) => Err(ParseError::ScoreNotObject(index)),
        None => Ok(()),
    }
}

// 结构体也能从数组反序列化，这里只接受对象
fn decode_object<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ParseError> {
    if !value.is_object() {
        return Err(ParseError::NotObject);
    }
    serde_json::from_value(value).map_err(ParseError::InvalidShape)
}

// 未加代码块、前后夹杂说明文字时，取第一个 `{` 到最后一个 `}`
fn embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// 解析 OCR 响应，返回显式的成功/失败
pub fn try_parse_ocr_response(response_text: &str) -> Result<Page, ParseError> {
    if response_text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let candidate = extract_json_block(response_text);
    let value: Value = serde_json::from_str(candidate).map_err(ParseError::NotJson)?;
    decode_object(value)
}

/// 解析 OCR 响应
///
/// 任何失败都退化为：学号、姓名为空，原始响应全文作为作文正文保留。
pub fn parse_ocr_response(response_text: &str) -> Page {
    try_parse_ocr_response(response_text).unwrap_or_else(|_| Page::raw(response_text))
}
