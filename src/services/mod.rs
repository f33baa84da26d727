pub mod auth;
pub mod boundary_detector;
pub mod evaluation_selector;
pub mod file_intake;
pub mod multi_model;
pub mod ocr_service;
pub mod pdf_renderer;
pub mod prompt_builder;
pub mod report_writer;
pub mod response_parser;
pub mod rubric_loader;
pub mod submission_builder;

pub use boundary_detector::BoundaryDetector;
pub use evaluation_selector::EvaluationService;
pub use multi_model::MultiModelCaller;
pub use ocr_service::OcrService;
pub use submission_builder::SubmissionChunk;
