//! 识别流程 - 流程层
//!
//! 流程顺序：
//! 1. 逐个文件 OCR（串行）
//! 2. 每个文件做边界检测并切块
//! 3. 合并为提交物，区分已识别 / 无法识别

use tracing::{error, info, warn};

use crate::models::{Page, Submission};
use crate::services::file_intake::process_uploaded_file;
use crate::services::submission_builder::{build_submissions, split_into_chunks};
use crate::services::{BoundaryDetector, OcrService};
use crate::utils::logging::format_ocr_progress_message;

/// 未能处理的文件及原因
#[derive(Debug, Clone, PartialEq)]
pub struct FailedFile {
    pub name: String,
    pub reason: String,
}

/// 识别结果
#[derive(Debug, Default)]
pub struct IntakeOutcome {
    pub submissions: Vec<Submission>,
    /// 没有学号的块（显示用文件名）
    pub unidentified: Vec<String>,
    /// 格式不支持、ZIP 不合规或 OCR 失败的文件
    pub failed_files: Vec<FailedFile>,
}

/// 展开上传文件
///
/// 单个上传出错只影响它自己，其余文件照常处理。
pub fn expand_uploads(uploads: Vec<(String, Vec<u8>)>) -> (Vec<(String, Vec<u8>)>, Vec<FailedFile>) {
    let mut files = Vec::new();
    let mut failed = Vec::new();

    for (name, bytes) in uploads {
        match process_uploaded_file(&name, bytes) {
            Ok(expanded) => files.extend(expanded),
            Err(e) => {
                error!("❌ 文件处理错误 ({}): {}", name, e);
                failed.push(FailedFile {
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }

    (files, failed)
}

/// 识别流程
pub struct IntakeFlow {
    ocr: OcrService,
    detector: BoundaryDetector,
}

impl IntakeFlow {
    pub fn new(ocr: OcrService, detector: BoundaryDetector) -> Self {
        Self { ocr, detector }
    }

    /// OCR 所有文件并识别提交物
    pub async fn run_ocr_and_identify(&self, files: Vec<(String, Vec<u8>)>) -> IntakeOutcome {
        let total = files.len();
        let mut outcome = IntakeOutcome::default();
        let mut file_pages: Vec<(String, Vec<Page>)> = Vec::with_capacity(total);

        for (i, (name, bytes)) in files.into_iter().enumerate() {
            info!("[文件 {}] {}", i + 1, format_ocr_progress_message(total, i + 1));

            match self.ocr.ocr_file(&name, bytes).await {
                Ok(pages) => {
                    info!("[文件 {}] ✓ {} 识别完成，共 {} 页", i + 1, name, pages.len());
                    file_pages.push((name, pages));
                }
                Err(e) => {
                    error!("[文件 {}] ❌ {} 识别失败: {:#}", i + 1, name, e);
                    outcome.failed_files.push(FailedFile {
                        name,
                        reason: format!("{:#}", e),
                    });
                }
            }
        }

        let mut chunks = Vec::new();
        for (name, pages) in &file_pages {
            let groups = self.detector.detect_boundaries(pages).await;
            chunks.extend(split_into_chunks(name, pages, &groups));
        }

        let (submissions, unidentified) = build_submissions(&chunks);
        info!("✓ 共识别出 {} 份提交物", submissions.len());
        if !unidentified.is_empty() {
            warn!(
                "⚠️ 以下 {} 个文件无法识别学号，将不参与批改: {}",
                unidentified.len(),
                unidentified.join(", ")
            );
        }

        outcome.submissions = submissions;
        outcome.unidentified = unidentified;
        outcome
    }
}
