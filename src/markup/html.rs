//! 基于 quick-xml 的 HTML 片段树
//!
//! 文字处理软件导出的 HTML 并不是严格的 XML：`<img>`、`<br>` 不闭合，
//! 结束标签可能缺失或错位，还会出现 `&nbsp;` 之类的 HTML 实体。
//! 这里关闭 quick-xml 的结束标签检查，自己维护元素栈来容忍这些情况。
//! 读入前先去掉 Word 的条件注释外壳 `<![if ...]>` / `<![endif]>`（保留中间内容），
//! 并把后面不跟标签名的 `<` 转义成文本。仍然读不懂的片段按原文保留为文本，不会丢。

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use super::{MarkupNode, MarkupTree};

/// 不需要结束标签的 HTML 元素
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// HTML 节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    Text(String),
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        children: Vec<HtmlNode>,
    },
}

impl HtmlNode {
    pub fn element(name: impl Into<String>, attrs: Vec<(String, String)>) -> Self {
        HtmlNode::Element {
            name: name.into(),
            attrs,
            children: Vec::new(),
        }
    }

    fn is_void(name: &str) -> bool {
        VOID_ELEMENTS.contains(&name)
    }
}

impl MarkupNode for HtmlNode {
    fn as_text(&self) -> Option<&str> {
        match self {
            HtmlNode::Text(text) => Some(text),
            HtmlNode::Element { .. } => None,
        }
    }

    fn tag_name(&self) -> Option<&str> {
        match self {
            HtmlNode::Text(_) => None,
            HtmlNode::Element { name, .. } => Some(name),
        }
    }

    fn attr(&self, key: &str) -> Option<&str> {
        match self {
            HtmlNode::Text(_) => None,
            HtmlNode::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str()),
        }
    }

    fn children(&self) -> &[Self] {
        match self {
            HtmlNode::Text(_) => &[],
            HtmlNode::Element { children, .. } => children,
        }
    }

    fn text_node(text: impl Into<String>) -> Self {
        HtmlNode::Text(text.into())
    }

    fn with_children(&self, new_children: Vec<Self>) -> Self {
        match self {
            HtmlNode::Text(_) => self.clone(),
            HtmlNode::Element { name, attrs, .. } => HtmlNode::Element {
                name: name.clone(),
                attrs: attrs.clone(),
                children: new_children,
            },
        }
    }

    fn to_markup(&self) -> String {
        let mut out = String::new();
        write_node(self, &mut out);
        out
    }
}

fn write_node(node: &HtmlNode, out: &mut String) {
    match node {
        HtmlNode::Text(text) => write_text(text, out),
        HtmlNode::Element {
            name,
            attrs,
            children,
        } => {
            out.push('<');
            out.push_str(name);
            for (key, value) in attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape(value.as_str()));
                out.push('"');
            }
            if HtmlNode::is_void(name) && children.is_empty() {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

/// quick-xml 驱动的 [`MarkupTree`] 实现
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTree;

/// 正在构建中的元素
struct OpenElement {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<HtmlNode>,
}

impl OpenElement {
    fn close(self) -> HtmlNode {
        HtmlNode::Element {
            name: self.name,
            attrs: self.attrs,
            children: self.children,
        }
    }
}

/// 元素栈，栈底是虚拟根
struct TreeBuilder {
    root: Vec<HtmlNode>,
    stack: Vec<OpenElement>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn push_node(&mut self, node: HtmlNode) {
        match self.stack.last_mut() {
            Some(open) => open.children.push(node),
            None => self.root.push(node),
        }
    }

    fn push_text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        let siblings = match self.stack.last_mut() {
            Some(open) => &mut open.children,
            None => &mut self.root,
        };
        // 实体拆开的相邻文本合并成一个节点
        if let Some(HtmlNode::Text(prev)) = siblings.last_mut() {
            prev.push_str(&text);
        } else {
            siblings.push(HtmlNode::Text(text));
        }
    }

    fn open(&mut self, name: String, attrs: Vec<(String, String)>) {
        self.stack.push(OpenElement {
            name,
            attrs,
            children: Vec::new(),
        });
    }

    fn close(&mut self, name: &str) {
        // 没有匹配的开始标签：忽略这个结束标签
        let Some(pos) = self.stack.iter().rposition(|open| open.name == name) else {
            return;
        };
        while self.stack.len() > pos {
            if let Some(open) = self.stack.pop() {
                self.push_node(open.close());
            }
        }
    }

    fn finish(mut self) -> Vec<HtmlNode> {
        while let Some(open) = self.stack.pop() {
            self.push_node(open.close());
        }
        self.root
    }
}

/// 文本转义：`<`、`>`、`&` 转义，但不认识的实体引用（如 `&foo;`）原样写回
fn write_text(text: &str, out: &mut String) {
    let mut rest = text;
    while let Some(i) = rest.find(|c: char| matches!(c, '&' | '<' | '>')) {
        out.push_str(&rest[..i]);
        let tail = &rest[i..];
        if tail.starts_with('<') {
            out.push_str("&lt;");
        } else if tail.starts_with('>') {
            out.push_str("&gt;");
        } else if is_unknown_entity_ref(tail) {
            out.push('&');
        } else {
            out.push_str("&amp;");
        }
        rest = &tail[1..];
    }
    out.push_str(rest);
}

/// Word 的条件注释外壳，例如 `<![if !vml]>`、`<![if !supportLists]>`、`<![endif]>`
static CONDITIONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!\[(?:if\b[^\]]*|endif)\]>").expect("条件注释正则"));

/// Word 的段落占位元素 `<o:p>`，只含空白
static OFFICE_PARAGRAPH_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<o:p\s*/>|<o:p>.*?</o:p>").expect("o:p 正则"));

/// 实体引用：十进制、十六进制、命名
static ENTITY_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|([A-Za-z][A-Za-z0-9]{1,31}));")
        .expect("实体正则")
});

static LEADING_NAMED_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^&([A-Za-z][A-Za-z0-9]{1,31});").expect("实体正则"));

impl MarkupTree for HtmlTree {
    type Node = HtmlNode;

    fn parse_fragment(&self, markup: &str) -> Vec<HtmlNode> {
        self.parse_with_skipped(markup).0
    }

    fn parse_with_skipped(&self, markup: &str) -> (Vec<HtmlNode>, Vec<String>) {
        let source = prepare_source(markup);
        let mut builder = TreeBuilder::new();
        let mut skipped = Vec::new();

        // 出错时跳过出错的标记（到下一个 `>`），从其后重新开始读
        let mut offset = 0;
        while offset < source.len() {
            let rest = &source[offset..];
            let Err((position, error)) = read_events(rest, &mut builder) else {
                break;
            };
            let start = (position..=rest.len())
                .find(|i| rest.is_char_boundary(*i))
                .unwrap_or(rest.len());
            let end = rest[start..].find('>').map_or(rest.len(), |i| start + i + 1);
            let span = &rest[start..end];
            if !span.is_empty() {
                warn!("⚠️ 无法识别的标记，按原文保留: {} ({})", span, error);
                builder.push_text(span.to_string());
                skipped.push(span.to_string());
            }
            offset += end;
        }

        (builder.finish(), skipped)
    }
}

/// 读到结尾返回 `Ok`；出错时返回出错事件的起始位置
fn read_events(
    source: &str,
    builder: &mut TreeBuilder,
) -> Result<(), (usize, quick_xml::Error)> {
    let mut reader = Reader::from_str(source);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    loop {
        let position = usize::try_from(reader.buffer_position()).unwrap_or(source.len());
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let (name, attrs) = read_start(&e);
                if HtmlNode::is_void(&name) {
                    builder.push_node(HtmlNode::element(name, attrs));
                } else {
                    builder.open(name, attrs);
                }
            }
            Ok(Event::Empty(e)) => {
                let (name, attrs) = read_start(&e);
                builder.push_node(HtmlNode::element(name, attrs));
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                if !HtmlNode::is_void(&name) {
                    builder.close(&name);
                }
            }
            Ok(Event::Text(e)) => {
                builder.push_text(decode_entities(&String::from_utf8_lossy(&e)));
            }
            Ok(Event::CData(e)) => {
                builder.push_text(String::from_utf8_lossy(&e).into_owned());
            }
            Ok(Event::Eof) => return Ok(()),
            Ok(_) => {}
            Err(e) => return Err((position.min(source.len()), e)),
        }
    }
}

/// 读入前的文本级清理
fn prepare_source(markup: &str) -> String {
    let without_conditionals = CONDITIONAL.replace_all(markup, "");
    let without_marks = OFFICE_PARAGRAPH_MARK.replace_all(&without_conditionals, "");
    escape_bare_lt(&without_marks)
}

/// 后面不跟标签名、`/`、`!`、`?` 的 `<` 是正文，例如 `x < 3`
fn escape_bare_lt(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        let starts_markup = chars
            .peek()
            .is_some_and(|next| next.is_ascii_alphabetic() || matches!(*next, '/' | '!' | '?'));
        if c == '<' && !starts_markup {
            out.push_str("&lt;");
        } else {
            out.push(c);
        }
    }
    out
}

fn read_start(e: &BytesStart<'_>) -> (String, Vec<(String, String)>) {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
    let attrs = e
        .html_attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let value = decode_entities(&String::from_utf8_lossy(&attr.value));
            (key, value)
        })
        .collect();
    (name, attrs)
}

/// 逐个解码实体引用
///
/// 不认识的命名实体和非法码点保留原文，不影响同一段文本里的其他实体。
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    ENTITY_REF
        .replace_all(raw, |caps: &regex::Captures| {
            let decoded = if let Some(dec) = caps.get(1) {
                dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else if let Some(hex) = caps.get(2) {
                u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
            } else {
                caps.get(3)
                    .and_then(|name| named_entity(name.as_str()))
                    .and_then(|s| s.chars().next())
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn is_unknown_entity_ref(tail: &str) -> bool {
    LEADING_NAMED_REF
        .captures(tail)
        .and_then(|caps| caps.get(1))
        .is_some_and(|name| named_entity(name.as_str()).is_none())
}

/// XML 预定义实体加上导出文档里常见的 HTML 实体
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("lt", "<"),
    ("gt", ">"),
    ("amp", "&"),
    ("apos", "'"),
    ("quot", "\""),
    ("nbsp", "\u{a0}"),
    ("ndash", "\u{2013}"),
    ("mdash", "\u{2014}"),
    ("hellip", "\u{2026}"),
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("ldquo", "\u{201c}"),
    ("rdquo", "\u{201d}"),
    ("laquo", "\u{ab}"),
    ("raquo", "\u{bb}"),
    ("bull", "\u{2022}"),
    ("middot", "\u{b7}"),
    ("times", "\u{d7}"),
    ("divide", "\u{f7}"),
    ("deg", "\u{b0}"),
    ("plusmn", "\u{b1}"),
    ("minus", "\u{2212}"),
    ("sup2", "\u{b2}"),
    ("sup3", "\u{b3}"),
    ("frac12", "\u{bd}"),
    ("frac14", "\u{bc}"),
    ("frac34", "\u{be}"),
    ("le", "\u{2264}"),
    ("ge", "\u{2265}"),
    ("ne", "\u{2260}"),
    ("asymp", "\u{2248}"),
    ("infin", "\u{221e}"),
    ("radic", "\u{221a}"),
    ("sum", "\u{2211}"),
    ("prod", "\u{220f}"),
    ("int", "\u{222b}"),
    ("ang", "\u{2220}"),
    ("perp", "\u{22a5}"),
    ("isin", "\u{2208}"),
    ("notin", "\u{2209}"),
    ("cap", "\u{2229}"),
    ("cup", "\u{222a}"),
    ("sub", "\u{2282}"),
    ("sup", "\u{2283}"),
    ("sube", "\u{2286}"),
    ("supe", "\u{2287}"),
    ("empty", "\u{2205}"),
    ("forall", "\u{2200}"),
    ("exist", "\u{2203}"),
    ("there4", "\u{2234}"),
    ("prime", "\u{2032}"),
    ("larr", "\u{2190}"),
    ("rarr", "\u{2192}"),
    ("harr", "\u{2194}"),
    ("rArr", "\u{21d2}"),
    ("hArr", "\u{21d4}"),
    ("alpha", "\u{3b1}"),
    ("beta", "\u{3b2}"),
    ("gamma", "\u{3b3}"),
    ("delta", "\u{3b4}"),
    ("epsilon", "\u{3b5}"),
    ("theta", "\u{3b8}"),
    ("lambda", "\u{3bb}"),
    ("mu", "\u{3bc}"),
    ("pi", "\u{3c0}"),
    ("rho", "\u{3c1}"),
    ("sigma", "\u{3c3}"),
    ("tau", "\u{3c4}"),
    ("phi", "\u{3c6}"),
    ("omega", "\u{3c9}"),
    ("Delta", "\u{394}"),
    ("Sigma", "\u{3a3}"),
    ("Omega", "\u{3a9}"),
];

fn named_entity(name: &str) -> Option<&'static str> {
    NAMED_ENTITIES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, resolved)| *resolved)
}
