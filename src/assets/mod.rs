//! 图片资源层
//!
//! 一个图片引用的生命周期：
//!
//! ```text
//! 相对路径 ──to_local_preview──▶ 临时句柄 ──resolve_to_durable──▶ 持久地址
//!    │                              │
//!    └─ 找不到文件：保持原样          └─ 未登记 / 上传失败：保持原样
//! ```
//!
//! - `index` - 本地文件的后缀匹配索引
//! - `registry` - 临时句柄 → 文件的登记表
//! - `resolver` - 在内容字符串上完成上述改写

pub mod index;
pub mod registry;
pub mod resolver;

pub use index::AssetIndex;
pub use registry::{ephemeral_handles, BlobFileRegistry};
pub use resolver::{AssetResolver, PreviewOutcome, ResolutionPass};
