use anyhow::{Context, Result};
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::ImportReport;

/// 初始化 tracing 订阅者
///
/// 默认 `info` 级别，可用 `RUST_LOG` 覆盖；`verbose` 时默认 `debug`。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
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
        "{}\n题目导入日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目导入模式");
    info!("📁 导入目录: {}", config.source_folder);
    info!("🗂️ 目标集合: {} | 题池: {}", config.target_collection, config.pool_id);
    info!(
        "📊 最大并发数: 草稿 {} / 图片 {}",
        config.max_concurrent_drafts, config.max_concurrent_uploads
    );
    info!("{}", "=".repeat(60));
}

/// 记录解析结果
///
/// # 参数
/// - `total`: 草稿总数
/// - `flagged`: 带问题的草稿数
/// - `max_concurrent`: 最大并发数
pub fn log_drafts_parsed(total: usize, flagged: usize, max_concurrent: usize) {
    info!("✓ 解析出 {} 个题目草稿", total);
    if flagged > 0 {
        info!("⚠️ 其中 {} 个带有待复核问题", flagged);
    }
    info!("📋 将以最多 {} 个并发的方式提交\n", max_concurrent);
}

/// 打印最终统计信息
pub fn print_final_stats(report: &ImportReport, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.succeeded, report.total());
    info!("❌ 失败: {}", report.failed);
    info!("🔎 需复核: {}", report.needing_review().count());
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
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
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_text("Thủ đô", 3), "Thủ...");
        assert_eq!(truncate_text("abc", 3), "abc");
    }

    #[test]
    fn test_log_file_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        init_log_file(&path.to_string_lossy()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("题目导入日志"));
    }
}
