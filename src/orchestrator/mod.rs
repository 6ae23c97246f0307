//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `session` - 导入会话
//! - 持有草稿、临时句柄登记表、本地文件索引
//! - 预览阶段的图片改写和人工替换
//!
//! ### `import_orchestrator` - 导入编排器
//! - 准备会话（解析一次）
//! - 控制并发数量，按文档顺序汇总结果
//!
//! ## 层次关系
//!
//! ```text
//! import_orchestrator (处理 Vec<QuestionDraft>)
//!     ↓
//! workflow::DraftFlow (处理单个 QuestionDraft)
//!     ↓
//! services / assets (能力层：upload / store / review)
//!     ↓
//! clients (HTTP)
//! ```

pub mod import_orchestrator;
pub mod session;

pub use import_orchestrator::ImportOrchestrator;
pub use session::ImportSession;
