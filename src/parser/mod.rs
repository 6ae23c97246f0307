//! 文档解析层
//!
//! - `patterns` - 题号、选项标记、解析标题、答案的文本约定
//! - `segmenter` - 选项切分器
//! - `document` - 段落状态机

pub mod document;
pub mod patterns;
pub mod segmenter;

pub use document::DocumentParser;
pub use segmenter::OptionSegmenter;
