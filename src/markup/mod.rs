//! 标记树抽象 - 基础设施层
//!
//! 解析器和选项切分器只依赖这里的 trait，不认识任何具体的树实现。
//! 默认实现见 [`html::HtmlTree`]。

pub mod html;

pub use html::{decode_entities, HtmlNode, HtmlTree};

/// 标记树中的一个节点（段落、行内元素或文本）
pub trait MarkupNode: Clone {
    /// 文本节点返回其文本，元素返回 `None`
    fn as_text(&self) -> Option<&str>;

    /// 元素标签名（小写），文本节点返回 `None`
    fn tag_name(&self) -> Option<&str>;

    /// 读取元素属性
    fn attr(&self, name: &str) -> Option<&str>;

    /// 子节点，文本节点为空
    fn children(&self) -> &[Self];

    /// 新建文本节点
    fn text_node(text: impl Into<String>) -> Self;

    /// 复制当前元素并替换子节点；文本节点原样返回
    fn with_children(&self, children: Vec<Self>) -> Self;

    /// 序列化为标记字符串
    fn to_markup(&self) -> String;

    /// 递归拼接的纯文本内容
    fn text_content(&self) -> String {
        match self.as_text() {
            Some(text) => text.to_string(),
            None => self.children().iter().map(|c| c.text_content()).collect(),
        }
    }
}

/// 标记树能力：解析片段、序列化节点序列
pub trait MarkupTree {
    type Node: MarkupNode;

    /// 解析标记片段，返回顶层节点。不会失败，畸形输入尽力而为
    fn parse_fragment(&self, markup: &str) -> Vec<Self::Node>;

    /// 同 [`Self::parse_fragment`]，另外返回无法识别、按原文保留成文本的片段
    fn parse_with_skipped(&self, markup: &str) -> (Vec<Self::Node>, Vec<String>) {
        (self.parse_fragment(markup), Vec::new())
    }

    fn serialize(&self, nodes: &[Self::Node]) -> String {
        nodes.iter().map(MarkupNode::to_markup).collect()
    }
}

/// 折叠空白（含不换行空格）并去掉首尾空白
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 图片引用是否是本地相对路径（不是远程地址、data URI 或临时句柄）
pub fn is_relative_reference(src: &str) -> bool {
    let lower = src.trim().to_ascii_lowercase();
    !(lower.is_empty()
        || lower.starts_with("http:")
        || lower.starts_with("https:")
        || lower.starts_with("data:")
        || lower.starts_with("blob:")
        || lower.starts_with("//"))
}

/// 收集节点内所有 `<img>` 的 src
pub fn collect_image_sources<N: MarkupNode>(node: &N, out: &mut Vec<String>) {
    if node.tag_name() == Some("img") {
        if let Some(src) = node.attr("src") {
            out.push(src.to_string());
        }
    }
    for child in node.children() {
        collect_image_sources(child, out);
    }
}

/// 节点是否含有可见内容（非空白文本或图片）
pub fn has_visible_content<N: MarkupNode>(node: &N) -> bool {
    match node.as_text() {
        Some(text) => !text.trim().is_empty(),
        None => node.tag_name() == Some("img") || node.children().iter().any(has_visible_content),
    }
}

/// 从节点的文本流开头去掉 `count` 个字符，保留其余结构
///
/// 文本流即 [`MarkupNode::text_content`] 的拼接顺序，因此对 `text_content`
/// 做正则匹配得到的字符数可以直接用在这里。文字被全部去掉的元素一并删除。
pub fn strip_leading_chars<N: MarkupNode>(node: &N, count: usize) -> N {
    let mut remaining = count;
    strip_inner(node, &mut remaining).unwrap_or_else(|| N::text_node(String::new()))
}

fn strip_inner<N: MarkupNode>(node: &N, remaining: &mut usize) -> Option<N> {
    if *remaining == 0 {
        return Some(node.clone());
    }
    if let Some(text) = node.as_text() {
        let len = text.chars().count();
        if len <= *remaining {
            *remaining -= len;
            return None;
        }
        let rest: String = text.chars().skip(*remaining).collect();
        *remaining = 0;
        return Some(N::text_node(rest));
    }
    // 没有子节点的元素（图片、换行）不占文本流
    if node.children().is_empty() {
        return Some(node.clone());
    }
    let children: Vec<N> = node
        .children()
        .iter()
        .filter_map(|child| strip_inner(child, remaining))
        .collect();
    if children.is_empty() {
        return None;
    }
    Some(node.with_children(children))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_collapses_nbsp() {
        assert_eq!(normalize_text("  Câu\u{a0}1:\n  abc "), "Câu 1: abc");
    }

    #[test]
    fn test_strip_leading_chars_across_nodes() {
        let tree = HtmlTree;
        let nodes = tree.parse_fragment("<p><b>Câu 1</b>: Thủ đô <i>Pháp</i>?</p>");
        let stripped = strip_leading_chars(&nodes[0], "Câu 1: ".chars().count());
        assert_eq!(stripped.text_content(), "Thủ đô Pháp?");
        assert_eq!(stripped.to_markup(), "<p>Thủ đô <i>Pháp</i>?</p>");

        let whole = strip_leading_chars(&nodes[0], 100);
        assert!(!has_visible_content(&whole));
    }

    #[test]
    fn test_relative_reference_detection() {
        assert!(is_relative_reference("sub/img1.png"));
        assert!(is_relative_reference("de_thi_files\\image001.png"));
        assert!(!is_relative_reference("https://cdn.example.com/a.png"));
        assert!(!is_relative_reference("blob:quiz-import/1234"));
        assert!(!is_relative_reference("data:image/png;base64,AAAA"));
        assert!(!is_relative_reference(""));
    }

    #[test]
    fn test_collect_image_sources() {
        let tree = HtmlTree;
        let nodes = tree.parse_fragment(r#"<p>x <img src="a.png"> <span><img src="sub/b.png"/></span></p>"#);
        let mut out = Vec::new();
        collect_image_sources(&nodes[0], &mut out);
        assert_eq!(out, vec!["a.png", "sub/b.png"]);
        assert!(has_visible_content(&nodes[0]));
    }
}
