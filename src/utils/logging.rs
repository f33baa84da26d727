//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 默认级别 info，可通过 `RUST_LOG` 覆盖
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n作文批改日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(input_folder: &str, models: &[&str]) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 作文批量批改模式");
    info!("📁 输入目录: {}", input_folder);
    info!("🤖 评分模型: {}", models.join(", "));
    info!("{}", "=".repeat(60));
}

/// 记录阶段开始
pub fn log_stage(title: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📦 {}", title);
    info!("{}", "=".repeat(60));
}

/// OCR 进度消息
///
/// # 参数
/// - `total`: 文件总数
/// - `current`: 当前文件序号（从 1 开始）
pub fn format_ocr_progress_message(total: usize, current: usize) -> String {
    format!("共 {} 个文件，正在识别第 {} 个...", total, current)
}

/// 批改进度消息
///
/// # 参数
/// - `total`: 提交物总数
/// - `current`: 当前提交物序号（从 1 开始）
pub fn format_progress_message(total: usize, current: usize) -> String {
    format!("共 {} 份提交物，正在批改第 {} 份...", total, current)
}

/// 打印最终统计信息
///
/// # 参数
/// - `graded`: 批改成功数量
/// - `total`: 提交物总数
/// - `unidentified`: 无法识别的文件数量
/// - `failed_files`: 未能处理的文件数量
/// - `report_path`: 报告路径
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(
    graded: usize,
    total: usize,
    unidentified: usize,
    failed_files: usize,
    report_path: &str,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已批改: {}/{}", graded, total);
    info!("❓ 无法识别: {}", unidentified);
    info!("❌ 未处理文件: {}", failed_files);
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", report_path);
    info!("日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("가나다라", 2), "가나...");
        assert_eq!(truncate_text("abc", 3), "abc");
    }

    #[test]
    fn test_progress_messages() {
        assert_eq!(format_progress_message(5, 2), "共 5 份提交物，正在批改第 2 份...");
        assert_eq!(format_ocr_progress_message(3, 1), "共 3 个文件，正在识别第 1 个...");
    }
}
