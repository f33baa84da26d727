pub mod evaluation;
pub mod page;
pub mod rubric;

pub use evaluation::{
    EvaluationResult, GradedSubmission, ModelEvaluation, ModelId, ModelOutcome, ScoreItem,
};
pub use page::{Page, Submission};
pub use rubric::{format_number, format_rubric, RubricItem};
