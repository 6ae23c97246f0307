//! 文档解析器
//!
//! 按文档顺序扫描段落，用一个三态状态机把段落归入题干、选项或解析。
//! 文档没有正式结构，这里只做尽力而为的切分，无法归类的段落记为
//! `StructuralAmbiguity` 留给人工复核，不会中断解析。

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use super::patterns::{self, is_option_line, is_solution_header, question_label};
use super::segmenter::OptionSegmenter;
use crate::markup::{
    collect_image_sources, has_visible_content, is_relative_reference, normalize_text,
    strip_leading_chars, MarkupNode, MarkupTree,
};
use crate::models::{DraftIssue, QuestionDraft};

/// 直接展开子节点的容器元素
const CONTAINER_TAGS: &[&str] = &["html", "body", "ol", "ul", "section", "article", "main"];

/// 只有在含块级子元素时才展开的元素
const WRAPPER_TAGS: &[&str] = &["div", "center"];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "table", "ol", "ul", "li", "blockquote",
];

/// 不含正文的元素
const SKIPPED_TAGS: &[&str] = &["head", "style", "script", "title", "meta", "link"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    ScanningContent,
    ScanningSolution,
}

/// 文档解析器，对标记树实现泛型
pub struct DocumentParser<T: MarkupTree> {
    tree: T,
    segmenter: OptionSegmenter,
}

impl<T: MarkupTree> DocumentParser<T> {
    pub fn new(tree: T) -> Self {
        Self {
            tree,
            segmenter: OptionSegmenter,
        }
    }

    /// 解析整篇文档，返回按文档顺序排列的题目草稿
    ///
    /// 不会失败；畸形输入得到零个或若干个只含部分数据的草稿。
    pub fn parse(&self, document_markup: &str) -> Vec<QuestionDraft> {
        let (nodes, skipped) = self.tree.parse_with_skipped(document_markup);
        let mut paragraphs = Vec::new();
        collect_paragraphs(nodes, &mut paragraphs);
        debug!("文档共 {} 个段落", paragraphs.len());

        let mut run = ParseRun::new(&self.segmenter, skipped);
        for paragraph in &paragraphs {
            run.step(paragraph);
        }
        let (drafts, ignored) = run.finish();

        if ignored > 0 {
            info!("⚠️ {} 个段落不属于任何题目，已忽略", ignored);
        }
        info!("✓ 文档解析完成，共 {} 道题目", drafts.len());
        drafts
    }
}

/// 把顶层节点展开成段落序列
fn collect_paragraphs<N: MarkupNode>(nodes: Vec<N>, out: &mut Vec<N>) {
    for node in nodes {
        match node.tag_name() {
            None => {
                if has_visible_content(&node) {
                    out.push(node);
                }
            }
            Some(tag) if SKIPPED_TAGS.contains(&tag) => {}
            Some(tag) if CONTAINER_TAGS.contains(&tag) => {
                collect_paragraphs(node.children().to_vec(), out)
            }
            Some(tag) if WRAPPER_TAGS.contains(&tag) && has_block_child(&node) => {
                collect_paragraphs(node.children().to_vec(), out)
            }
            Some(_) => out.push(node),
        }
    }
}

fn has_block_child<N: MarkupNode>(node: &N) -> bool {
    node.children()
        .iter()
        .filter_map(MarkupNode::tag_name)
        .any(|tag| BLOCK_TAGS.contains(&tag))
}

/// 一次解析的可变状态
struct ParseRun<'a> {
    segmenter: &'a OptionSegmenter,
    state: ScanState,
    current: Option<QuestionDraft>,
    drafts: Vec<QuestionDraft>,
    ignored: usize,
    /// 标记树按原文保留的片段，按文档顺序等待归到所在段落
    skipped: VecDeque<String>,
}

impl<'a> ParseRun<'a> {
    fn new(segmenter: &'a OptionSegmenter, skipped: Vec<String>) -> Self {
        Self {
            segmenter,
            state: ScanState::Idle,
            current: None,
            drafts: Vec::new(),
            ignored: 0,
            skipped: skipped.into(),
        }
    }

    fn step<N: MarkupNode>(&mut self, paragraph: &N) {
        let raw_text = paragraph.text_content();
        let spans = self.take_skipped(&raw_text);
        self.classify(paragraph, &raw_text);

        // 段落归类之后再记，段首的题号会先开启新题
        for span in spans {
            match self.current.as_mut() {
                Some(draft) => draft.issues.push(DraftIssue::ambiguity(format!(
                    "无法识别的标记，已按原文保留: {}",
                    span
                ))),
                None => warn!("⚠️ 题目之外的无法识别标记: {}", span),
            }
        }
    }

    /// 取出落在这段文字里的保留片段，按出现顺序匹配
    fn take_skipped(&mut self, raw_text: &str) -> Vec<String> {
        let mut taken = Vec::new();
        let mut cursor = 0;
        while let Some(span) = self.skipped.front() {
            let Some(found) = raw_text[cursor..].find(span.as_str()) else {
                break;
            };
            cursor += found + span.len();
            taken.extend(self.skipped.pop_front());
        }
        taken
    }

    fn classify<N: MarkupNode>(&mut self, paragraph: &N, raw_text: &str) {
        let text = normalize_text(raw_text);

        // 题号优先，任何状态下都开启新题
        if let Some(label) = question_label(&text) {
            self.open_draft(label, paragraph, raw_text);
            self.state = ScanState::ScanningContent;
            return;
        }

        if is_solution_header(&text) {
            self.state = ScanState::ScanningSolution;
            // 标题本身不进入任何字段，但 "Lời giải: Chọn B" 这类写法的答案要收下
            if let Some(draft) = self.current.as_mut() {
                set_answer(draft, &text);
            }
            return;
        }

        let Some(draft) = self.current.as_mut() else {
            if !text.is_empty() {
                debug!("题目之外的段落，忽略: {}", text);
                self.ignored += 1;
            }
            return;
        };

        match self.state {
            ScanState::ScanningContent => {
                if is_option_line(&text, !draft.options.is_empty()) {
                    let options = self.segmenter.segment(paragraph);
                    if options.is_empty() {
                        draft.issues.push(DraftIssue::ambiguity(format!(
                            "疑似选项行但未切分出选项: {}",
                            text
                        )));
                        append_markup(draft, Field::Content, paragraph);
                    } else {
                        record_images(draft, paragraph);
                        draft.options.extend(options);
                    }
                } else {
                    append_markup(draft, Field::Content, paragraph);
                }
            }
            ScanState::ScanningSolution => {
                set_answer(draft, &text);
                append_markup(draft, Field::Explanation, paragraph);
            }
            ScanState::Idle => {
                self.ignored += 1;
            }
        }
    }

    fn open_draft<N: MarkupNode>(&mut self, label: String, paragraph: &N, raw_text: &str) {
        self.emit_current();

        let local_id = format!("q{}", self.drafts.len() + 1);
        debug!("开始新题目 {} ({})", label, local_id);
        let mut draft = QuestionDraft::new(local_id, label);

        // 题号同一段里的题干文字
        let rest = strip_leading_chars(paragraph, patterns::question_marker_chars(raw_text));
        if has_visible_content(&rest) {
            append_markup(&mut draft, Field::Content, &rest);
        }

        self.current = Some(draft);
    }

    fn emit_current(&mut self) {
        if let Some(mut draft) = self.current.take() {
            finalize(&mut draft);
            self.drafts.push(draft);
        }
    }

    fn finish(mut self) -> (Vec<QuestionDraft>, usize) {
        self.emit_current();
        for span in &self.skipped {
            warn!("⚠️ 无法识别的标记不在任何段落中: {}", span);
        }
        (self.drafts, self.ignored)
    }
}

#[derive(Clone, Copy)]
enum Field {
    Content,
    Explanation,
}

/// 追加段落的完整标记，保留原有结构和行内图片
fn append_markup<N: MarkupNode>(draft: &mut QuestionDraft, field: Field, paragraph: &N) {
    record_images(draft, paragraph);
    let markup = paragraph.to_markup();
    match field {
        Field::Content => draft.content.push_str(&markup),
        Field::Explanation => draft.explanation.push_str(&markup),
    }
}

fn record_images<N: MarkupNode>(draft: &mut QuestionDraft, paragraph: &N) {
    let mut sources = Vec::new();
    collect_image_sources(paragraph, &mut sources);
    draft.referenced_image_paths.extend(
        sources
            .into_iter()
            .filter(|src| is_relative_reference(src)),
    );
}

/// 只取第一次出现的答案
fn set_answer(draft: &mut QuestionDraft, text: &str) {
    if !draft.correct_answer_label.is_empty() {
        return;
    }
    if let Some(letter) = patterns::answer_label(text) {
        draft.correct_answer_label = letter.to_string();
    }
}

/// 草稿收尾：标记正确选项，记录需要复核的结构问题
fn finalize(draft: &mut QuestionDraft) {
    draft.apply_correct_answer();

    if draft.options.is_empty() {
        draft.issues.push(DraftIssue::ambiguity("没有识别到选项"));
    }
    if draft.correct_answer_label.is_empty() {
        draft.issues.push(DraftIssue::ambiguity("没有识别到正确答案"));
    } else if !draft.options.is_empty() && !draft.has_correct_option() {
        draft.issues.push(DraftIssue::ambiguity(format!(
            "答案 {} 不对应任何选项",
            draft.correct_answer_label
        )));
    }
}
