//! 批改流程 - 流程层
//!
//! 提交物逐份批改（串行）；某一份三个模型全部失败时立即停止，
//! 已批改的部分照常交给报告。

use std::fmt;

use tracing::{error, info};

use crate::models::{GradedSubmission, Submission};
use crate::services::EvaluationService;
use crate::utils::logging::format_progress_message;
use crate::utils::truncate_text;

/// 批改中断：第 `ordinal` 份（从 1 开始）没有任何有效评分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradingFailure {
    pub ordinal: usize,
}

impl fmt::Display for GradingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "第 {} 份提交物批改出错，无法继续。已批改部分的报告已经生成，请先保存；重新运行需要从头开始。",
            self.ordinal
        )
    }
}

/// 批改结果
#[derive(Debug, Default)]
pub struct GradingOutcome {
    pub graded: Vec<GradedSubmission>,
    pub failure: Option<GradingFailure>,
}

/// 批改流程
pub struct GradingFlow {
    evaluator: EvaluationService,
    verbose_logging: bool,
}

impl GradingFlow {
    pub fn new(evaluator: EvaluationService, verbose_logging: bool) -> Self {
        Self {
            evaluator,
            verbose_logging,
        }
    }

    /// 逐份批改，遇到第一份失败即停止
    pub async fn grade_submissions(
        &self,
        submissions: Vec<Submission>,
        rubric_text: &str,
    ) -> GradingOutcome {
        let total = submissions.len();
        let mut outcome = GradingOutcome::default();

        for (i, submission) in submissions.into_iter().enumerate() {
            let ordinal = i + 1;
            info!("[提交物 {}] {}", ordinal, format_progress_message(total, ordinal));
            info!(
                "[提交物 {}] 学号: {} | 姓名: {} | 来源: {}",
                ordinal, submission.student_id, submission.student_name, submission.source
            );
            if self.verbose_logging {
                info!(
                    "[提交物 {}] 正文: {}",
                    ordinal,
                    truncate_text(&submission.essay_text, 80)
                );
            }

            match self
                .evaluator
                .evaluate_essay(&submission.essay_text, rubric_text)
                .await
            {
                Some(evaluation) => {
                    info!(
                        "[提交物 {}] ✓ 最终得分 {}",
                        ordinal,
                        evaluation.best.total_score()
                    );
                    outcome.graded.push(GradedSubmission {
                        submission,
                        evaluation,
                    });
                }
                None => {
                    let failure = GradingFailure { ordinal };
                    error!("[提交物 {}] ❌ {}", ordinal, failure);
                    outcome.failure = Some(failure);
                    break;
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ChatBackend;
    use crate::error::LlmError;
    use crate::services::MultiModelCaller;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// 作文正文包含 "BROKEN" 时返回无效内容
    struct EssayAwareBackend {
        score: u32,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatBackend for EssayAwareBackend {
        fn model_name(&self) -> &str {
            "essay-aware"
        }

        async fn send_to_llm(
            &self,
            user_message: &str,
            _imgs: Option<&[String]>,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if user_message.contains("BROKEN") {
                return Ok("I refuse.".to_string());
            }
            Ok(format!(
                r#"{{"scores": [{{"item_number": 1, "score": {}}}], "feedback": "ok"}}"#,
                self.score
            ))
        }
    }

    fn flow() -> (Arc<EssayAwareBackend>, GradingFlow) {
        let gemini = Arc::new(EssayAwareBackend { score: 4, calls: AtomicUsize::new(0) });
        let caller = MultiModelCaller::new(
            gemini.clone(),
            Arc::new(EssayAwareBackend { score: 6, calls: AtomicUsize::new(0) }),
            Arc::new(EssayAwareBackend { score: 5, calls: AtomicUsize::new(0) }),
        );
        (gemini, GradingFlow::new(EvaluationService::new(caller), false))
    }

    fn submission(id: &str, text: &str) -> Submission {
        Submission {
            student_id: id.to_string(),
            student_name: String::new(),
            essay_text: text.to_string(),
            source: format!("{id}.png"),
        }
    }

    #[tokio::test]
    async fn test_all_submissions_graded() {
        let (_, flow) = flow();
        let outcome = flow
            .grade_submissions(
                vec![submission("10301", "a"), submission("10302", "b")],
                "rubric",
            )
            .await;

        assert!(outcome.failure.is_none());
        assert_eq!(outcome.graded.len(), 2);
        assert_eq!(outcome.graded[0].evaluation.best.total_score(), 6.0);
    }

    #[tokio::test]
    async fn test_stops_at_first_total_failure() {
        let (gemini, flow) = flow();
        let outcome = flow
            .grade_submissions(
                vec![
                    submission("10301", "fine"),
                    submission("10302", "BROKEN"),
                    submission("10303", "never graded"),
                ],
                "rubric",
            )
            .await;

        assert_eq!(outcome.graded.len(), 1);
        assert_eq!(outcome.failure, Some(GradingFailure { ordinal: 2 }));
        assert_eq!(gemini.calls.load(Ordering::SeqCst), 2);

        let message = outcome.failure.unwrap().to_string();
        assert!(message.contains("第 2 份"));
        assert!(message.contains("报告"));
    }
}
