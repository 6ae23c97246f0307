//! 文档里约定俗成的文本标记
//!
//! 题号、选项字母、解析标题、答案引导语。这些模式与导出文档的书写习惯
//! 逐字对应，修改前先确认现有文档不会被误判。

use regex::Regex;
use std::sync::LazyLock;

/// 题号："Câu 1"、"Question 12"，后面可跟 `:` 或 `.`
pub static QUESTION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(Câu|Question)\s+(\d+)\s*[:.]?\s*").expect("题号正则")
});

/// 选项字母标记：行首或空白之后的 A–D，紧跟 `.` 或 `:`
pub static OPTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)([A-D])[.:]").expect("选项标记正则"));

/// 整段文本恰好是一个选项标记，如加粗的 "A."
pub static BARE_OPTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-D])[.:]\s*$").expect("独立选项标记正则"));

/// 答案引导语后跟单个字母："Chọn C"、"Đáp án: B"、"Answer A"
pub static ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:chọn|đáp án|answer)\s*[:.]?\s*([A-D])(?:[^\p{L}\p{N}]|$)").expect("答案正则")
});

/// 解析标题关键字，小写比较
pub const SOLUTION_HEADERS: &[&str] = &["lời giải", "hướng dẫn giải"];

/// 匹配题号，返回 "关键字 数字" 形式的标签
pub fn question_label(text: &str) -> Option<String> {
    let caps = QUESTION_START.captures(text)?;
    Some(format!("{} {}", &caps[1], &caps[2]))
}

/// 题号标记（含其后的分隔符和空白）占多少个字符
pub fn question_marker_chars(text: &str) -> usize {
    QUESTION_START
        .find(text)
        .map(|m| text[..m.end()].chars().count())
        .unwrap_or(0)
}

pub fn is_solution_header(text: &str) -> bool {
    let lower = text.to_lowercase();
    SOLUTION_HEADERS.iter().any(|h| lower.contains(h))
}

/// 提取正确答案字母
pub fn answer_label(text: &str) -> Option<char> {
    ANSWER
        .captures(text)
        .and_then(|caps| caps[1].chars().next())
}

/// 文本中出现的所有选项字母，按出现顺序
pub fn marker_letters(text: &str) -> Vec<char> {
    OPTION_MARKER
        .captures_iter(text)
        .filter_map(|caps| caps[1].chars().next())
        .collect()
}

/// 文本以选项标记开头时返回该字母
pub fn leading_marker(text: &str) -> Option<char> {
    OPTION_MARKER
        .captures(text)
        .filter(|caps| caps.get(0).map(|m| m.start()) == Some(0))
        .and_then(|caps| caps[1].chars().next())
}

/// 选项行判定
///
/// 同时含 A、B 标记，或以 A 标记开头。已经识别出选项后，以任意 A–D 标记
/// 开头的段落也算选项行，用于每段一个选项的文档。
pub fn is_option_line(text: &str, has_options: bool) -> bool {
    let letters = marker_letters(text);
    if letters.contains(&'A') && letters.contains(&'B') {
        return true;
    }
    match leading_marker(text) {
        Some('A') => true,
        Some(_) => has_options,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_label() {
        assert_eq!(question_label("Câu 1: Thủ đô?").as_deref(), Some("Câu 1"));
        assert_eq!(question_label("Question 12. What?").as_deref(), Some("Question 12"));
        assert_eq!(question_label("Câu hỏi 1"), None);
        assert_eq!(question_label("Trong Câu 1"), None);
        assert_eq!(question_marker_chars("Câu 1: Thủ đô?"), "Câu 1: ".chars().count());
    }

    #[test]
    fn test_solution_header_is_case_insensitive() {
        assert!(is_solution_header("LỜI GIẢI"));
        assert!(is_solution_header("Hướng dẫn giải chi tiết"));
        assert!(!is_solution_header("Giải thích"));
    }

    #[test]
    fn test_answer_label() {
        assert_eq!(answer_label("Chọn C"), Some('C'));
        assert_eq!(answer_label("Đáp án: B."), Some('B'));
        assert_eq!(answer_label("Answer D"), Some('D'));
        assert_eq!(answer_label("Chọn Đúng"), None);
        assert_eq!(answer_label("Answer Depends"), None);
        assert_eq!(answer_label("Ta có x = 2"), None);
    }

    #[test]
    fn test_option_line_heuristic() {
        assert!(is_option_line("A. Paris B. London", false));
        assert!(is_option_line("A: Paris", false));
        assert!(!is_option_line("B. London", false));
        assert!(is_option_line("B. London", true));
        assert!(!is_option_line("Tính giá trị biểu thức.", true));
        assert!(!is_option_line("Vitamin A.", false));
    }
}
