use serde::Serialize;

/// 评分标准表的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RubricItem {
    pub item_number: String,
    pub criterion: String,
    pub max_score: f64,
}

/// 把评分标准渲染为 `item_number | criterion | max_score` 文本，供提示词使用
pub fn format_rubric(items: &[RubricItem]) -> String {
    let mut lines = vec!["item_number | criterion | max_score".to_string()];
    for item in items {
        lines.push(format!(
            "{} | {} | {}",
            item.item_number,
            item.criterion,
            format_number(item.max_score)
        ));
    }
    lines.join("\n")
}

/// 整数值不带小数点输出
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
