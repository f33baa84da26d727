pub mod grading_flow;
pub mod intake_flow;

pub use grading_flow::{GradingFailure, GradingFlow, GradingOutcome};
pub use intake_flow::{expand_uploads, FailedFile, IntakeFlow, IntakeOutcome};
