//! 选项切分器
//!
//! 把一个包含多个选项的段落切成带字母的选项片段。
//! 遍历是纯函数：状态对象按值传入、按值返回。

use tracing::trace;

use super::patterns::{BARE_OPTION_MARKER, OPTION_MARKER};
use crate::markup::{has_visible_content, MarkupNode};
use crate::models::OptionDraft;

/// 遍历过程中的状态
#[derive(Debug)]
struct SegmentState<N> {
    /// 当前选项字母，第一个标记之前为 `None`
    label: Option<char>,
    /// 当前选项已收集的片段
    buffer: Vec<N>,
    completed: Vec<OptionDraft>,
}

impl<N: MarkupNode> SegmentState<N> {
    fn new() -> Self {
        Self {
            label: None,
            buffer: Vec::new(),
            completed: Vec::new(),
        }
    }

    /// 把缓冲区收成一个选项（需要有字母且缓冲区有内容），然后清空缓冲区
    fn flush(mut self) -> Self {
        let buffer = std::mem::take(&mut self.buffer);
        if let Some(label) = self.label {
            if buffer.iter().any(has_visible_content) {
                let content: String = buffer.iter().map(MarkupNode::to_markup).collect();
                self.completed
                    .push(OptionDraft::new(label, content.trim().to_string()));
            }
        }
        self
    }

    fn start_option(self, label: char) -> Self {
        let mut state = self.flush();
        state.label = Some(label);
        state
    }

    /// 第一个标记之前的内容是噪声，直接丢弃
    fn push(mut self, node: N) -> Self {
        if self.label.is_some() {
            self.buffer.push(node);
        }
        self
    }
}

/// 选项切分器
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionSegmenter;

impl OptionSegmenter {
    /// 切分一个已判定为选项行的段落
    ///
    /// 返回顺序即遍历顺序；字母只取自文中的标记，不会凭空补齐。
    pub fn segment<N: MarkupNode>(&self, paragraph: &N) -> Vec<OptionDraft> {
        let state = paragraph
            .children()
            .iter()
            .fold(SegmentState::new(), walk);
        let options = state.flush().completed;
        trace!("段落切分出 {} 个选项", options.len());
        options
    }
}

fn walk<N: MarkupNode>(state: SegmentState<N>, node: &N) -> SegmentState<N> {
    match node.as_text() {
        Some(text) => walk_text(state, text),
        None => walk_element(state, node),
    }
}

/// 文本节点：按其中的标记切开，标记本身去掉
fn walk_text<N: MarkupNode>(mut state: SegmentState<N>, text: &str) -> SegmentState<N> {
    let mut cursor = 0;
    for caps in OPTION_MARKER.captures_iter(text) {
        let (Some(whole), Some(letter)) = (caps.get(0), caps[1].chars().next()) else {
            continue;
        };
        let before = &text[cursor..whole.start()];
        if !before.is_empty() {
            state = state.push(N::text_node(before));
        }
        state = state.start_option(letter);
        cursor = whole.end();
    }
    let rest = &text[cursor..];
    if !rest.is_empty() {
        state = state.push(N::text_node(rest));
    }
    state
}

fn walk_element<N: MarkupNode>(state: SegmentState<N>, node: &N) -> SegmentState<N> {
    let text = node.text_content();

    // 元素本身就是一个标记，例如 <b>A.</b>
    if let Some(caps) = BARE_OPTION_MARKER.captures(&text) {
        if let Some(letter) = caps[1].chars().next() {
            return state.start_option(letter);
        }
    }

    // 标记藏在行内格式里面，拆开递归
    if OPTION_MARKER.is_match(&text) {
        return node.children().iter().fold(state, walk);
    }

    // 不含标记，整体作为内容
    state.push(node.clone())
}
