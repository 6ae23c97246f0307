//! 复核记录写入服务 - 业务能力层
//!
//! 只负责"写 review.txt"能力，不关心流程

use anyhow::{Context, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::models::DraftOutcome;

/// 复核记录写入服务
///
/// 职责：
/// - 将需要人工复核的草稿追加写入复核文件
/// - 只处理单个草稿
/// - 不关心流程顺序
pub struct ReviewWriter {
    review_file_path: String,
}

impl ReviewWriter {
    pub fn new() -> Self {
        Self {
            review_file_path: "review.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            review_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.review_file_path
    }

    /// 写入一条复核记录
    ///
    /// 不需要复核的结果直接跳过，返回是否写入
    pub async fn write(&self, outcome: &DraftOutcome) -> Result<bool> {
        if !outcome.needs_review() {
            return Ok(false);
        }

        debug!(
            "写入复核记录: {} | 问题数: {}",
            outcome.local_id,
            outcome.issues.len()
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.review_file_path)
            .await
            .with_context(|| format!("无法打开复核文件: {}", self.review_file_path))?;

        let line = format!("{}\n", outcome);
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(true)
    }
}

impl Default for ReviewWriter {
    fn default() -> Self {
        Self::new()
    }
}
