//! # Quiz Import
//!
//! 把文字处理器导出的 HTML 试题文档（连同引用的图片文件夹）导入题库
//!
//! ## 架构设计
//!
//! ### ① 基础设施层
//! - `markup/` - 标记树 trait 与基于 quick-xml 的 HTML 实现
//! - `clients/` - 上传服务、题库服务的 HTTP 客户端
//!
//! ### ② 业务能力层
//! - `parser/` - 段落状态机 `DocumentParser` 和选项切分器 `OptionSegmenter`
//! - `assets/` - 本地文件索引、临时句柄登记表、图片引用改写 `AssetResolver`
//! - `services/` - 协作方 trait（`AssetUploader` / `QuestionStore`）和复核记录写入
//!
//! ### ③ 流程层（Workflow）
//! - `DraftCtx` - 上下文封装（草稿序号 + 题号）
//! - `DraftFlow` - 单个草稿的提交流程（解析图片 → 保存 → 复核记录）
//!
//! ### ④ 编排层（Orchestration）
//! - `ImportSession` - 预览阶段的状态，支持人工替换图片
//! - `ImportOrchestrator` - 解析一次、并发提交、按文档顺序汇总
//!
//! ## 模块结构

pub mod assets;
pub mod clients;
pub mod config;
pub mod error;
pub mod markup;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use assets::{AssetIndex, AssetResolver, BlobFileRegistry};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use markup::{HtmlTree, MarkupNode, MarkupTree};
pub use models::{DraftIssue, ImportReport, LocalFile, OptionDraft, QuestionDraft, QuestionRecord};
pub use orchestrator::{ImportOrchestrator, ImportSession};
pub use parser::{DocumentParser, OptionSegmenter};
pub use workflow::{DraftCtx, DraftFlow};
