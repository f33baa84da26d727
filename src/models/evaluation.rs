use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::page::Submission;

/// 三个评分模型，顺序固定（同分时靠前者胜出）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelId {
    Gemini,
    OpenAi,
    Anthropic,
}

impl ModelId {
    pub const ALL: [ModelId; 3] = [ModelId::Gemini, ModelId::OpenAi, ModelId::Anthropic];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gemini => "gemini",
            ModelId::OpenAi => "openai",
            ModelId::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个评分项得分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreItem {
    pub item_number: i64,
    pub score: f64,
}

/// 单个模型的评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluation {
    pub scores: Vec<ScoreItem>,
    pub feedback: String,
}

impl ModelEvaluation {
    /// 所有评分项得分之和
    pub fn total_score(&self) -> f64 {
        self.scores.iter().map(|item| item.score).sum()
    }
}

/// 某个模型的结果，`None` 表示调用失败或返回无效
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutcome {
    pub model: ModelId,
    pub evaluation: Option<ModelEvaluation>,
}

/// 一份提交物的最终评分结果
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub best: ModelEvaluation,
    pub best_model: ModelId,
    pub by_model: Vec<ModelOutcome>,
}

impl EvaluationResult {
    pub fn for_model(&self, model: ModelId) -> Option<&ModelEvaluation> {
        self.by_model
            .iter()
            .find(|outcome| outcome.model == model)
            .and_then(|outcome| outcome.evaluation.as_ref())
    }
}

/// 已批改的提交物
#[derive(Debug, Clone, PartialEq)]
pub struct GradedSubmission {
    pub submission: Submission,
    pub evaluation: EvaluationResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_score_sums_fractional_scores() {
        let evaluation = ModelEvaluation {
            scores: vec![
                ScoreItem { item_number: 1, score: 2.5 },
                ScoreItem { item_number: 2, score: 3.0 },
            ],
            feedback: String::new(),
        };
        assert_eq!(evaluation.total_score(), 5.5);
    }

    #[test]
    fn test_for_model_skips_failed_entries() {
        let good = ModelEvaluation {
            scores: vec![ScoreItem { item_number: 1, score: 4.0 }],
            feedback: "ok".to_string(),
        };
        let result = EvaluationResult {
            best: good.clone(),
            best_model: ModelId::OpenAi,
            by_model: vec![
                ModelOutcome { model: ModelId::Gemini, evaluation: None },
                ModelOutcome { model: ModelId::OpenAi, evaluation: Some(good.clone()) },
                ModelOutcome { model: ModelId::Anthropic, evaluation: None },
            ],
        };
        assert_eq!(result.for_model(ModelId::Gemini), None);
        assert_eq!(result.for_model(ModelId::OpenAi), Some(&good));
    }
}
