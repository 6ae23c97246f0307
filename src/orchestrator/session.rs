//! 导入会话
//!
//! 预览阶段的全部状态：解析出的草稿和临时句柄登记表。本地文件索引只在预览时使用。
//! 预览阶段只追加登记，提交阶段只读。

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assets::{AssetIndex, AssetResolver, BlobFileRegistry};
use crate::markup::MarkupTree;
use crate::models::{DraftIssue, LocalFile, QuestionDraft};
use crate::parser::DocumentParser;

pub struct ImportSession {
    drafts: Vec<QuestionDraft>,
    registry: BlobFileRegistry,
}

impl ImportSession {
    /// 建索引、解析一次文档、把每个草稿的相对图片路径换成临时句柄
    ///
    /// 找不到文件的引用保持原样，并在对应草稿上记录 `AssetNotFound`。
    pub fn prepare<T: MarkupTree>(
        parser: &DocumentParser<T>,
        document_markup: &str,
        files: Vec<LocalFile>,
    ) -> Self {
        let index = AssetIndex::build(files);
        let mut registry = BlobFileRegistry::default();
        let mut drafts = parser.parse(document_markup);
        info!("📄 解析完成: {} 个草稿, {} 个本地文件", drafts.len(), index.len());

        for draft in drafts.iter_mut() {
            let mut known: HashMap<String, String> = HashMap::new();
            let mut unresolved: Vec<String> = Vec::new();

            draft.rewrite_fields(|field| {
                let outcome = AssetResolver::to_local_preview_with(field, &index, &mut known);
                registry.extend(outcome.registry_updates);
                for reference in outcome.unresolved {
                    if !unresolved.contains(&reference) {
                        unresolved.push(reference);
                    }
                }
                outcome.content
            });

            if !known.is_empty() {
                debug!("[{}] 预览图片 {} 张", draft.local_id, known.len());
            }
            for reference in unresolved {
                warn!("[{}] ⚠️ 找不到图片文件: {}", draft.local_id, reference);
                draft.issues.push(DraftIssue::AssetNotFound { reference });
            }
        }

        Self { drafts, registry }
    }

    pub fn drafts(&self) -> &[QuestionDraft] {
        &self.drafts
    }

    pub fn draft(&self, local_id: &str) -> Option<&QuestionDraft> {
        self.drafts.iter().find(|d| d.local_id == local_id)
    }

    pub fn registry(&self) -> &BlobFileRegistry {
        &self.registry
    }

    /// 人工替换一张图
    ///
    /// `old_reference` 可以是临时句柄，也可以是未解析的原始路径。新文件登记为一个新句柄，
    /// 草稿所有字段中等于 `old_reference` 的图片引用都换成它。返回新句柄；草稿不存在时返回 `None`。
    pub fn replace_image(
        &mut self,
        local_id: &str,
        old_reference: &str,
        file: LocalFile,
    ) -> Option<String> {
        let draft = self.drafts.iter_mut().find(|d| d.local_id == local_id)?;

        let handle = self.registry.register(Arc::new(file));
        draft.rewrite_fields(|field| AssetResolver::replace_one(field, old_reference, &handle));
        draft.issues.retain(|issue| {
            !matches!(issue, DraftIssue::AssetNotFound { reference } if reference == old_reference)
        });

        info!("[{}] 🔁 图片已替换: {} → {}", local_id, old_reference, handle);
        Some(handle)
    }
}
