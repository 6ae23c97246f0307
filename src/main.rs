use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use tracing::{info, warn};

use quiz_import::config::Config;
use quiz_import::error::FileError;
use quiz_import::markup::HtmlTree;
use quiz_import::models::{load_local_files, pick_markup_document, read_markup_document, ImportReport};
use quiz_import::orchestrator::ImportOrchestrator;
use quiz_import::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::init_log_file(&config.output_log_file)?;
    logging::log_startup(&config);

    // 扫描导入目录
    info!("\n📁 正在扫描导入目录...");
    let files = load_local_files(&config.source_folder).await?;
    if files.is_empty() {
        warn!("⚠️ 导入目录为空，程序结束");
        return Ok(());
    }

    let document = pick_markup_document(&files, config.document_name.as_deref())
        .ok_or(FileError::NoMarkupDocument)?;
    info!("✓ 标记文档: {} (共 {} 个文件)", document.relative_path, files.len());
    let markup = read_markup_document(document).await?;

    let pool = config.pool_assignment();
    let target_collection = config.target_collection.clone();
    let orchestrator = ImportOrchestrator::from_config(config);

    let report = orchestrator
        .import(HtmlTree, &markup, files, &target_collection, &pool)
        .await;

    append_report(&orchestrator.config().output_log_file, &report)?;
    logging::print_final_stats(&report, &orchestrator.config().output_log_file);

    Ok(())
}

/// 把每个草稿的结果和 JSON 报告追加到运行日志
fn append_report(log_file_path: &str, report: &ImportReport) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path))?;

    for entry in &report.entries {
        writeln!(file, "{}", entry)?;
    }
    writeln!(file, "\n{}", serde_json::to_string_pretty(report)?)?;
    Ok(())
}
