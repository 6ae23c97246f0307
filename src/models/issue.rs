//! 草稿级别的异常分类
//!
//! 这些都不是致命错误：记录下来，批次继续，最终出现在导入报告和复核文件里。

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DraftIssue {
    /// 段落无法归类，按普通内容处理或忽略
    #[error("结构不明确: {detail}")]
    StructuralAmbiguity { detail: String },
    /// 图片相对路径在本地文件中找不到
    #[error("找不到图片文件: {reference}")]
    AssetNotFound { reference: String },
    /// 内容里的临时句柄没有登记对应文件
    #[error("临时句柄未登记: {handle}")]
    UnregisteredAsset { handle: String },
    /// 上传失败，引用保持原样
    #[error("图片上传失败 ({handle}): {reason}")]
    UploadFailure { handle: String, reason: String },
    /// 存储拒绝了最终记录
    #[error("题目保存失败: {reason}")]
    PersistenceFailure { reason: String },
}

impl DraftIssue {
    pub fn ambiguity(detail: impl Into<String>) -> Self {
        DraftIssue::StructuralAmbiguity {
            detail: detail.into(),
        }
    }
}
