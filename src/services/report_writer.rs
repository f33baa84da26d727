//! 报告生成 - 业务能力层
//!
//! 已批改的提交物 → 按学号、作品编号排序的表格 → xlsx 工作簿。

use std::collections::HashMap;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

use crate::models::{GradedSubmission, ModelEvaluation, ModelId};

/// 工作表名称
pub const SHEET_NAME: &str = "report";

/// 单元格可容纳的最大字符数
const MAX_CELL_CHARS: usize = 32_767;

/// 报告表头，与 `ReportRow` 字段一一对应
pub const REPORT_HEADERS: [&str; 11] = [
    "学号",
    "姓名",
    "作品编号",
    "作文正文",
    "总分(GPT)",
    "总分(Gemini)",
    "总分(Claude)",
    "反馈(GPT)",
    "反馈(Gemini)",
    "反馈(Claude)",
    "最终得分",
];

/// 报告中的一行；模型失败时对应的总分为 `None`、反馈为空
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub student_id: String,
    pub student_name: String,
    pub work_number: usize,
    pub essay_text: String,
    pub total_openai: Option<f64>,
    pub total_gemini: Option<f64>,
    pub total_anthropic: Option<f64>,
    pub feedback_openai: String,
    pub feedback_gemini: String,
    pub feedback_anthropic: String,
    pub final_score: f64,
}

fn model_total(evaluation: Option<&ModelEvaluation>) -> Option<f64> {
    evaluation.map(ModelEvaluation::total_score)
}

fn model_feedback(evaluation: Option<&ModelEvaluation>) -> String {
    evaluation.map(|e| e.feedback.clone()).unwrap_or_default()
}

/// 按学号首次出现的顺序分配作品编号（1, 2, 3…）
pub fn assign_work_numbers(graded: &[GradedSubmission]) -> Vec<usize> {
    let mut counters: HashMap<&str, usize> = HashMap::new();
    graded
        .iter()
        .map(|g| {
            let counter = counters.entry(g.submission.student_id.as_str()).or_insert(0);
            *counter += 1;
            *counter
        })
        .collect()
}

/// 生成报告行，按学号升序、作品编号升序排列
pub fn build_report_rows(graded: &[GradedSubmission]) -> Vec<ReportRow> {
    let work_numbers = assign_work_numbers(graded);

    let mut rows: Vec<ReportRow> = graded
        .iter()
        .zip(work_numbers)
        .map(|(g, work_number)| {
            let eval = &g.evaluation;
            ReportRow {
                student_id: g.submission.student_id.clone(),
                student_name: g.submission.student_name.clone(),
                work_number,
                essay_text: g.submission.essay_text.clone(),
                total_openai: model_total(eval.for_model(ModelId::OpenAi)),
                total_gemini: model_total(eval.for_model(ModelId::Gemini)),
                total_anthropic: model_total(eval.for_model(ModelId::Anthropic)),
                feedback_openai: model_feedback(eval.for_model(ModelId::OpenAi)),
                feedback_gemini: model_feedback(eval.for_model(ModelId::Gemini)),
                feedback_anthropic: model_feedback(eval.for_model(ModelId::Anthropic)),
                final_score: eval.best.total_score(),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        a.student_id
            .cmp(&b.student_id)
            .then(a.work_number.cmp(&b.work_number))
    });
    rows
}

/// 超出单元格上限的文本截断
fn clip_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

// 空文本留空白单元格
fn write_text(sheet: &mut Worksheet, row: u32, col: u16, text: &str) -> Result<()> {
    if !text.is_empty() {
        sheet.write_string(row, col, clip_cell(text))?;
    }
    Ok(())
}

fn write_row(sheet: &mut Worksheet, row: u32, record: &ReportRow) -> Result<()> {
    write_text(sheet, row, 0, &record.student_id)?;
    write_text(sheet, row, 1, &record.student_name)?;
    sheet.write_number(row, 2, record.work_number as f64)?;
    write_text(sheet, row, 3, &record.essay_text)?;

    let totals = [record.total_openai, record.total_gemini, record.total_anthropic];
    for (col, total) in (4u16..).zip(totals) {
        if let Some(total) = total {
            sheet.write_number(row, col, total)?;
        }
    }

    let feedbacks = [
        &record.feedback_openai,
        &record.feedback_gemini,
        &record.feedback_anthropic,
    ];
    for (col, feedback) in (7u16..).zip(feedbacks) {
        write_text(sheet, row, col, feedback)?;
    }

    sheet.write_number(row, 10, record.final_score)?;
    Ok(())
}

/// 把报告行写成 xlsx 字节，没有数据行时也保留表头
pub fn write_report_xlsx(rows: &[ReportRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, header) in (0u16..).zip(REPORT_HEADERS) {
        sheet.write_string_with_format(0, col, header, &header_format)?;
    }
    sheet.set_column_width(3, 60)?;

    for (row, record) in (1u32..).zip(rows) {
        write_row(sheet, row, record)?;
    }

    workbook.save_to_buffer().context("生成 xlsx 失败")
}

/// 生成报告并保存到文件
///
/// # 返回
/// 写入的数据行数
pub async fn save_report(report_path: &str, graded: &[GradedSubmission]) -> Result<usize> {
    let rows = build_report_rows(graded);
    let bytes = write_report_xlsx(&rows)?;

    tokio::fs::write(report_path, bytes)
        .await
        .with_context(|| format!("无法写入报告文件: {}", report_path))?;

    info!("✓ 报告已写入 {} ({} 行)", report_path, rows.len());
    Ok(rows.len())
}
