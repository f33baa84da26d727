//! 提交物构建 - 业务能力层
//!
//! 把边界检测得到的分组切成命名块，再把每块的多页合并为一份提交物。

use crate::models::{Page, Submission};
use crate::utils::truncate_text;

/// 一个文件切分后的一块（一名学生的若干页）
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionChunk {
    /// 显示用文件名，多组时带 `#n` 后缀
    pub name: String,
    pub pages: Vec<Page>,
}

/// 按分组把一个文件的页面切成命名块
///
/// 只有一组时保留原文件名，多组时依次加 `#1`、`#2`…
pub fn split_into_chunks(
    file_name: &str,
    pages: &[Page],
    groups: &[Vec<usize>],
) -> Vec<SubmissionChunk> {
    let multiple = groups.len() > 1;

    groups
        .iter()
        .enumerate()
        .map(|(i, group)| SubmissionChunk {
            name: if multiple {
                format!("{}#{}", file_name, i + 1)
            } else {
                file_name.to_string()
            },
            pages: group
                .iter()
                .filter_map(|&index| pages.get(index).cloned())
                .collect(),
        })
        .collect()
}

/// 合并多页
///
/// 学号、姓名取第一个非空值；正文按页序用换行拼接，空正文的页不参与拼接。
pub fn merge_pages(pages: &[Page], source: &str) -> Submission {
    let essay_text = pages
        .iter()
        .map(|page| page.essay_text.as_str())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    Submission {
        student_id: first_non_empty(pages.iter().map(|page| page.student_id.as_str())),
        student_name: first_non_empty(pages.iter().map(|page| page.student_name.as_str())),
        essay_text,
        source: source.to_string(),
    }
}

fn first_non_empty<'a>(mut values: impl Iterator<Item = &'a str>) -> String {
    values
        .find(|value| !value.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// 构建提交物
///
/// # 返回
/// `(已识别的提交物, 无法识别的文件名)`，两者都保持文件顺序、组内顺序
pub fn build_submissions(chunks: &[SubmissionChunk]) -> (Vec<Submission>, Vec<String>) {
    let mut submissions = Vec::new();
    let mut unidentified = Vec::new();

    for chunk in chunks {
        let merged = merge_pages(&chunk.pages, &chunk.name);
        if merged.student_id.is_empty() {
            unidentified.push(chunk.name.clone());
        } else {
            submissions.push(merged);
        }
    }

    (submissions, unidentified)
}

/// 提交物预览文本
pub fn format_submissions_for_display(submissions: &[Submission]) -> String {
    let mut lines = vec!["student_id | student_name | preview".to_string()];
    for submission in submissions {
        let flattened = submission.essay_text.replace('\n', " ");
        lines.push(format!(
            "{} | {} | {}",
            submission.student_id,
            submission.student_name,
            truncate_text(&flattened, 50)
        ));
    }
    lines.join("\n")
}
