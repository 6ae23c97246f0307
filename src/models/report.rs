use serde::Serialize;
use std::fmt;

use super::issue::DraftIssue;

/// 单个草稿的最终状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DraftStatus {
    Imported {
        #[serde(rename = "recordId")]
        record_id: String,
    },
    Failed { reason: String },
}

/// 报告中每个草稿一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOutcome {
    pub local_id: String,
    pub label: String,
    #[serde(flatten)]
    pub status: DraftStatus,
    pub issues: Vec<DraftIssue>,
}

impl DraftOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self.status, DraftStatus::Imported { .. })
    }

    /// 有任何问题都需要人工复核，包括导入成功但带警告的
    pub fn needs_review(&self) -> bool {
        !self.is_imported() || !self.issues.is_empty()
    }
}

impl fmt::Display for DraftOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            DraftStatus::Imported { record_id } => {
                write!(f, "{} ({}) ✓ 已导入 #{}", self.label, self.local_id, record_id)?
            }
            DraftStatus::Failed { reason } => {
                write!(f, "{} ({}) ✗ 失败: {}", self.label, self.local_id, reason)?
            }
        }
        for issue in &self.issues {
            write!(f, " | {}", issue)?;
        }
        Ok(())
    }
}

/// 一次导入的汇总报告，条目按文档顺序
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub succeeded: usize,
    pub failed: usize,
    pub entries: Vec<DraftOutcome>,
}

impl ImportReport {
    pub fn push(&mut self, outcome: DraftOutcome) {
        if outcome.is_imported() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.entries.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn needing_review(&self) -> impl Iterator<Item = &DraftOutcome> {
        self.entries.iter().filter(|e| e.needs_review())
    }
}
