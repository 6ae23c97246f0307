//! 草稿处理上下文
//!
//! 封装"我正在提交第几个草稿"这一信息

use std::fmt::Display;

use crate::models::QuestionDraft;

/// 草稿处理上下文
///
/// 仅用于日志显示
#[derive(Debug, Clone)]
pub struct DraftCtx {
    /// 草稿在文档中的序号（从1开始）
    pub draft_index: usize,

    /// 草稿总数
    pub total: usize,

    pub local_id: String,

    /// 题号标签，如 "Câu 1"
    pub label: String,
}

impl DraftCtx {
    pub fn new(draft_index: usize, total: usize, draft: &QuestionDraft) -> Self {
        Self {
            draft_index,
            total,
            local_id: draft.local_id.clone(),
            label: draft.label.clone(),
        }
    }
}

impl Display for DraftCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[草稿 {}/{} {} {}]",
            self.draft_index, self.total, self.local_id, self.label
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let draft = QuestionDraft::new("q2", "Câu 2");
        assert_eq!(DraftCtx::new(2, 5, &draft).to_string(), "[草稿 2/5 q2 Câu 2]");
    }
}
