use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::issue::DraftIssue;

/// 解析得到、尚未入库的题目草稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    /// 会话内唯一的临时 ID，不会入库
    pub local_id: String,
    /// 题号标记，如 "Câu 1"
    pub label: String,
    /// 题干标记片段
    pub content: String,
    /// 按文档顺序排列的选项
    pub options: Vec<OptionDraft>,
    /// 正确答案字母，未确定时为空
    pub correct_answer_label: String,
    /// 解析标记片段
    pub explanation: String,
    /// 扫描时发现的图片相对路径，仅用于诊断
    pub referenced_image_paths: BTreeSet<String>,
    /// 解析阶段记录的异常
    #[serde(default)]
    pub issues: Vec<DraftIssue>,
}

impl QuestionDraft {
    pub fn new(local_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            local_id: local_id.into(),
            label: label.into(),
            ..Default::default()
        }
    }

    /// 按正确答案字母设置每个选项的 `is_correct`
    ///
    /// 没有显式字母的选项按位置取隐式字母（第 n 个选项对应第 n 个字母）。
    pub fn apply_correct_answer(&mut self) {
        let answer = self.correct_answer_label.chars().next();
        for (index, option) in self.options.iter_mut().enumerate() {
            option.is_correct = answer.is_some() && option.effective_label(index) == answer;
        }
    }

    /// 是否有选项被标记为正确
    pub fn has_correct_option(&self) -> bool {
        self.options.iter().any(|o| o.is_correct)
    }

    /// 题干、各选项、解析，按此顺序
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.content.as_str())
            .chain(self.options.iter().map(|o| o.content.as_str()))
            .chain(std::iter::once(self.explanation.as_str()))
    }

    /// 对每个内容字段应用同一个改写
    pub fn rewrite_fields(&mut self, mut rewrite: impl FnMut(&str) -> String) {
        self.content = rewrite(&self.content);
        for option in &mut self.options {
            option.content = rewrite(&option.content);
        }
        self.explanation = rewrite(&self.explanation);
    }
}

/// 选项草稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDraft {
    /// 显式字母；`None` 表示按位置推断
    pub label: Option<char>,
    /// 去掉字母标记后的选项内容
    pub content: String,
    pub is_correct: bool,
}

impl OptionDraft {
    pub fn new(label: char, content: impl Into<String>) -> Self {
        Self {
            label: Some(label),
            content: content.into(),
            is_correct: false,
        }
    }

    /// 显式字母，缺省时取位置字母
    pub fn effective_label(&self, index: usize) -> Option<char> {
        self.label.or_else(|| positional_label(index))
    }
}

/// 第 `index` 个选项的隐式字母（0 → 'A'）
pub fn positional_label(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| (b'A' + i) as char)
}
