//! 评分结果选择 - 业务能力层
//!
//! 三个模型各自解析，取总分最高者；同分保留固定顺序中靠前的模型。

use tracing::{debug, info, warn};

use crate::models::{EvaluationResult, ModelEvaluation, ModelId, ModelOutcome};
use crate::services::multi_model::{ModelReply, MultiModelCaller};
use crate::services::prompt_builder::build_evaluation_prompt;
use crate::services::response_parser::parse_evaluation_response;

/// 从三个原始响应中选出最佳评分
///
/// 全部失败或无效时返回 `None`。
pub fn select_best(replies: Vec<ModelReply>) -> Option<EvaluationResult> {
    let mut by_model = Vec::with_capacity(replies.len());
    let mut best: Option<(ModelId, ModelEvaluation, f64)> = None;

    for reply in replies {
        let evaluation = match reply.raw {
            Ok(text) => match parse_evaluation_response(&text) {
                Ok(evaluation) => Some(evaluation),
                Err(e) => {
                    warn!("[{}] ⚠️ 响应无效: {}", reply.model, e);
                    None
                }
            },
            Err(_) => None,
        };

        if let Some(evaluation) = &evaluation {
            let total = evaluation.total_score();
            debug!("[{}] 总分: {}", reply.model, total);
            // 严格大于：同分时保留先出现的模型
            if best.as_ref().map_or(true, |(_, _, best_total)| total > *best_total) {
                best = Some((reply.model, evaluation.clone(), total));
            }
        }

        by_model.push(ModelOutcome {
            model: reply.model,
            evaluation,
        });
    }

    best.map(|(best_model, best, _)| EvaluationResult {
        best,
        best_model,
        by_model,
    })
}

/// 作文评分服务：构建提示词 → 三模型并发调用 → 解析 → 选优
pub struct EvaluationService {
    caller: MultiModelCaller,
}

impl EvaluationService {
    pub fn new(caller: MultiModelCaller) -> Self {
        Self { caller }
    }

    /// 评分一篇作文，所有模型都失败时返回 `None`
    pub async fn evaluate_essay(
        &self,
        essay_text: &str,
        rubric_text: &str,
    ) -> Option<EvaluationResult> {
        let prompt = build_evaluation_prompt(rubric_text, essay_text);
        let replies = self.caller.call_all(&prompt).await;
        let result = select_best(replies);

        if let Some(result) = &result {
            info!(
                "✓ 采用 {} 的评分，总分 {}",
                result.best_model,
                result.best.total_score()
            );
        }

        result
    }
}
