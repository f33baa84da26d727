//! 评分标准读取 - 业务能力层
//!
//! 读取 xlsx 第一个工作表，表头必须是 `item_number | criterion | max_score`。

use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx};

use crate::error::RubricError;
use crate::models::{format_number, RubricItem};

/// 期望的表头
pub const EXPECTED_HEADERS: [&str; 3] = ["item_number", "criterion", "max_score"];

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR:{e:?}"),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

fn cell_number(cell: Option<&Data>) -> Option<f64> {
    match cell? {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        _ => None,
    }
}

fn is_blank_row(row: &[Data]) -> bool {
    row.iter().all(|cell| matches!(cell, Data::Empty))
}

/// 校验工作表内容
///
/// 行号按表格习惯从 1 开始，表头为第 1 行。
pub fn validate_rubric_rows(rows: &[Vec<Data>]) -> Result<(), RubricError> {
    let Some((header_row, data_rows)) = rows.split_first() else {
        return Err(RubricError::EmptySheet);
    };

    let mut headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell_text(cell).trim().to_string())
        .collect();
    while headers.last().is_some_and(|h| h.is_empty()) {
        headers.pop();
    }

    if headers != EXPECTED_HEADERS {
        return Err(RubricError::BadHeader {
            expected: EXPECTED_HEADERS.iter().map(|h| h.to_string()).collect(),
            actual: headers,
        });
    }

    let mut data_count = 0;
    for (offset, row) in data_rows.iter().enumerate() {
        if is_blank_row(row) {
            continue;
        }
        data_count += 1;

        if cell_number(row.get(2)).is_none() {
            return Err(RubricError::NonNumericScore {
                row: offset + 2,
                field: "max_score",
                value: row.get(2).map(cell_text).unwrap_or_default(),
            });
        }
    }

    if data_count == 0 {
        return Err(RubricError::NoDataRows);
    }

    Ok(())
}

/// 校验并解析为评分项
pub fn parse_rubric_rows(rows: &[Vec<Data>]) -> Result<Vec<RubricItem>, RubricError> {
    validate_rubric_rows(rows)?;

    Ok(rows[1..]
        .iter()
        .filter(|row| !is_blank_row(row))
        .map(|row| RubricItem {
            item_number: row.first().map(cell_text).unwrap_or_default(),
            criterion: row.get(1).map(cell_text).unwrap_or_default(),
            max_score: cell_number(row.get(2)).unwrap_or_default(),
        })
        .collect())
}

/// 从 xlsx 字节读取评分标准
pub fn load_rubric(file_bytes: &[u8]) -> Result<Vec<RubricItem>, RubricError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(file_bytes))
        .map_err(|e| RubricError::Unreadable(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| RubricError::Unreadable(e.to_string()))?,
        None => return Err(RubricError::EmptySheet),
    };

    parse_rubric_rows(&absolute_rows(&range))
}

/// 按绝对位置还原工作表：`Range` 从第一个非空单元格开始，
/// 这里补回前面的空行和空列，使表头始终对应 A1、行号与表格一致
pub fn absolute_rows(range: &Range<Data>) -> Vec<Vec<Data>> {
    let Some((first_row, first_col)) = range.start() else {
        return Vec::new();
    };

    let width = first_col as usize + range.width();
    let mut rows = vec![vec![Data::Empty; width]; first_row as usize];
    rows.extend(range.rows().map(|row| {
        let mut cells = vec![Data::Empty; first_col as usize];
        cells.extend_from_slice(row);
        cells
    }));
    rows
}
