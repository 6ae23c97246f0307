//! 导入编排器 - 编排层
//!
//! ## 职责
//!
//! 1. **准备**：建索引、解析一次文档、预览图片（[`ImportSession`]）
//! 2. **提交**：并发跑每个草稿的 [`DraftFlow`]，按文档顺序汇总
//! 3. **统计**：输出成功/失败/需复核数量
//!
//! 单个草稿的失败不会中断其余草稿；报告条目与文档顺序一致。

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::info;

use crate::assets::AssetResolver;
use crate::clients::{StoreClient, UploadClient};
use crate::config::Config;
use crate::markup::MarkupTree;
use crate::models::{ImportReport, LocalFile, PoolAssignment};
use crate::orchestrator::session::ImportSession;
use crate::parser::DocumentParser;
use crate::services::{AssetUploader, QuestionStore, ReviewWriter};
use crate::utils::logging;
use crate::workflow::{DraftCtx, DraftFlow};

pub struct ImportOrchestrator {
    config: Config,
    uploader: Arc<dyn AssetUploader>,
    store: Arc<dyn QuestionStore>,
}

impl ImportOrchestrator {
    pub fn new(
        config: Config,
        uploader: Arc<dyn AssetUploader>,
        store: Arc<dyn QuestionStore>,
    ) -> Self {
        Self {
            config,
            uploader,
            store,
        }
    }

    /// 使用 HTTP 客户端作为协作方
    pub fn from_config(config: Config) -> Self {
        let uploader = Arc::new(UploadClient::new(&config));
        let store = Arc::new(StoreClient::new(&config));
        Self::new(config, uploader, store)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn prepare<T: MarkupTree>(
        &self,
        tree: T,
        document_markup: &str,
        files: Vec<LocalFile>,
    ) -> ImportSession {
        let parser = DocumentParser::new(tree);
        let session = ImportSession::prepare(&parser, document_markup, files);

        let flagged = session
            .drafts()
            .iter()
            .filter(|d| !d.issues.is_empty())
            .count();
        logging::log_drafts_parsed(
            session.drafts().len(),
            flagged,
            self.config.max_concurrent_drafts,
        );
        session
    }

    /// 提交会话中的全部草稿
    ///
    /// 草稿并发提交（上限 `max_concurrent_drafts`），结果按文档顺序收集。
    pub async fn commit(
        &self,
        session: &ImportSession,
        target_collection: &str,
        pool: &PoolAssignment,
    ) -> ImportReport {
        let flow = self.draft_flow(target_collection, pool);
        let registry = session.registry();
        let drafts = session.drafts();
        let total = drafts.len();

        info!("📤 开始提交 {} 个草稿 → {}", total, target_collection);

        let outcomes: Vec<_> = stream::iter(drafts.iter().enumerate())
            .map(|(index, draft)| {
                let flow = &flow;
                async move {
                    let ctx = DraftCtx::new(index + 1, total, draft);
                    flow.run(draft, registry, &ctx).await
                }
            })
            .buffered(self.config.max_concurrent_drafts.max(1))
            .collect()
            .await;

        let mut report = ImportReport::default();
        for outcome in outcomes {
            report.push(outcome);
        }
        report
    }

    /// 准备 + 提交
    pub async fn import<T: MarkupTree>(
        &self,
        tree: T,
        document_markup: &str,
        files: Vec<LocalFile>,
        target_collection: &str,
        pool: &PoolAssignment,
    ) -> ImportReport {
        let session = self.prepare(tree, document_markup, files);
        self.commit(&session, target_collection, pool).await
    }

    fn draft_flow(&self, target_collection: &str, pool: &PoolAssignment) -> DraftFlow {
        let resolver = AssetResolver::new(
            self.uploader.clone(),
            self.config.asset_destination.clone(),
            self.config.max_concurrent_uploads,
        );
        let flow = DraftFlow::new(resolver, self.store.clone(), target_collection, pool.clone())
            .with_verbose_logging(self.config.verbose_logging);

        // 复核文件路径为空时不写
        if self.config.review_file.is_empty() {
            flow
        } else {
            flow.with_review_writer(ReviewWriter::with_path(self.config.review_file.clone()))
        }
    }
}
