//! 草稿提交流程 - 流程层
//!
//! 核心职责：定义"一个草稿"的完整提交流程
//!
//! 流程顺序：
//! 1. 解析图片：临时句柄 → 上传 → 持久地址
//! 2. 检查是否还有未解析的临时句柄，有则不入库
//! 3. 构建记录 → 保存
//! 4. review.txt（需要人工复核的都写）

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::assets::{ephemeral_handles, AssetResolver, BlobFileRegistry};
use crate::models::{
    DraftIssue, DraftOutcome, DraftStatus, PoolAssignment, QuestionDraft, QuestionRecord,
};
use crate::services::{QuestionStore, ReviewWriter};
use crate::utils::logging::truncate_text;
use crate::workflow::draft_ctx::DraftCtx;

/// 草稿提交流程
///
/// - 编排单个草稿的提交流程
/// - 不持有会话状态（登记表由调用方借入）
/// - 只依赖业务能力（resolver / store / review writer）
/// - 任何失败都只影响当前草稿，体现在返回的 [`DraftOutcome`] 里
pub struct DraftFlow {
    resolver: AssetResolver,
    store: Arc<dyn QuestionStore>,
    review_writer: Option<ReviewWriter>,
    collection: String,
    pool: PoolAssignment,
    verbose_logging: bool,
}

impl DraftFlow {
    pub fn new(
        resolver: AssetResolver,
        store: Arc<dyn QuestionStore>,
        collection: impl Into<String>,
        pool: PoolAssignment,
    ) -> Self {
        Self {
            resolver,
            store,
            review_writer: None,
            collection: collection.into(),
            pool,
            verbose_logging: false,
        }
    }

    /// 需要复核的结果追加写入复核文件
    pub fn with_review_writer(mut self, writer: ReviewWriter) -> Self {
        self.review_writer = Some(writer);
        self
    }

    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    pub async fn run(
        &self,
        draft: &QuestionDraft,
        registry: &BlobFileRegistry,
        ctx: &DraftCtx,
    ) -> DraftOutcome {
        if self.verbose_logging {
            info!("{} 题干: {}", ctx, truncate_text(&draft.content, 80));
        }

        // ========== 流程 1: 解析图片 ==========
        let (resolved, pass) = self.resolver.resolve_draft(draft, registry).await;
        if pass.upload_count() > 0 {
            info!("{} 🖼️ 上传图片 {} 张", ctx, pass.upload_count());
        }

        let mut issues = draft.issues.clone();
        issues.extend(pass.issues());

        // ========== 流程 2: 残留句柄检查 ==========
        let leftover = leftover_handles(&resolved);
        if leftover > 0 {
            warn!("{} ⚠️ 仍有 {} 个图片未能上传，跳过保存", ctx, leftover);
            let reason = format!("{} 个图片未能上传，临时句柄无法入库", leftover);
            return self.finish(ctx, draft, DraftStatus::Failed { reason }, issues).await;
        }

        // ========== 流程 3: 保存 ==========
        let record = QuestionRecord::from_draft(&resolved, &self.collection, &self.pool);
        let status = match self.store.persist_question_record(&record).await {
            Ok(record_id) => {
                info!("{} ✓ 题目已保存 #{}", ctx, record_id);
                DraftStatus::Imported { record_id }
            }
            Err(e) => {
                error!("{} ❌ 题目保存失败: {}", ctx, e);
                let reason = e.to_string();
                issues.push(DraftIssue::PersistenceFailure {
                    reason: reason.clone(),
                });
                DraftStatus::Failed { reason }
            }
        };

        self.finish(ctx, draft, status, issues).await
    }

    async fn finish(
        &self,
        ctx: &DraftCtx,
        draft: &QuestionDraft,
        status: DraftStatus,
        issues: Vec<DraftIssue>,
    ) -> DraftOutcome {
        let outcome = DraftOutcome {
            local_id: draft.local_id.clone(),
            label: draft.label.clone(),
            status,
            issues,
        };

        // ========== 流程 4: 复核记录 ==========
        if let Some(writer) = &self.review_writer {
            match writer.write(&outcome).await {
                Ok(true) => warn!("{} ⚠️ 已写入 {}", ctx, writer.path()),
                Ok(false) => {}
                Err(e) => error!("{} 写入复核记录失败: {}", ctx, e),
            }
        }

        outcome
    }
}

/// 所有字段中残留的临时句柄数量（去重）
fn leftover_handles(draft: &QuestionDraft) -> usize {
    let mut handles: Vec<String> = draft.fields().flat_map(ephemeral_handles).collect();
    handles.sort();
    handles.dedup();
    handles.len()
}
