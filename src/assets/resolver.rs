//! 图片引用改写
//!
//! 预览和人工替换是同步的纯字符串改写；提交时的持久化改写会挂起等待上传。

use futures::stream::{self, StreamExt};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

use super::index::AssetIndex;
use super::registry::{ephemeral_handles, replace_handles, BlobFileRegistry};
use crate::markup::{decode_entities, is_relative_reference};
use crate::models::{DraftIssue, FileHandle, QuestionDraft};
use crate::services::AssetUploader;

/// `<img ... src="...">` 的 src 属性，单双引号都认；`data-src` 之类不算
static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\ssrc\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).expect("图片属性正则")
});

/// 预览改写的结果
#[derive(Debug, Default)]
pub struct PreviewOutcome {
    /// 改写后的内容
    pub content: String,
    /// 新生成的句柄，需并入会话登记表
    pub registry_updates: HashMap<String, FileHandle>,
    /// 找不到文件、保持原样的相对路径
    pub unresolved: Vec<String>,
}

/// 一次持久化改写的记录
///
/// 同一个句柄在一次改写中只上传一次：上传前先查这里是否已经有结果。
#[derive(Debug, Default)]
pub struct ResolutionPass {
    resolved: HashMap<String, String>,
    failed: HashMap<String, DraftIssue>,
    uploads: usize,
}

impl ResolutionPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// 句柄已有结果（成功或失败）
    pub fn is_settled(&self, handle: &str) -> bool {
        self.resolved.contains_key(handle) || self.failed.contains_key(handle)
    }

    pub fn durable_location(&self, handle: &str) -> Option<&str> {
        self.resolved.get(handle).map(String::as_str)
    }

    /// 本次发出的上传次数
    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    /// 未能解析的句柄对应的问题，按句柄排序
    pub fn issues(&self) -> Vec<DraftIssue> {
        let mut failed: Vec<(&String, &DraftIssue)> = self.failed.iter().collect();
        failed.sort_by(|a, b| a.0.cmp(b.0));
        failed.into_iter().map(|(_, issue)| issue.clone()).collect()
    }

    fn rewrite(&self, content: &str) -> String {
        replace_handles(content, |handle| self.resolved.get(handle).cloned())
    }
}

/// 图片引用解析器
pub struct AssetResolver {
    uploader: Arc<dyn AssetUploader>,
    destination_hint: String,
    max_concurrent_uploads: usize,
}

impl AssetResolver {
    pub fn new(
        uploader: Arc<dyn AssetUploader>,
        destination_hint: impl Into<String>,
        max_concurrent_uploads: usize,
    ) -> Self {
        Self {
            uploader,
            destination_hint: destination_hint.into(),
            max_concurrent_uploads: max_concurrent_uploads.max(1),
        }
    }

    /// 相对路径 → 临时句柄
    ///
    /// 只处理相对路径；远程地址、data URI、已有句柄原样保留。找不到文件的引用也保持原样。
    pub fn to_local_preview(content: &str, index: &AssetIndex) -> PreviewOutcome {
        Self::to_local_preview_with(content, index, &mut HashMap::new())
    }

    /// 同 [`Self::to_local_preview`]，`known` 记录已为哪些路径生成过句柄
    ///
    /// 同一草稿的各字段共用一个 `known`，同一张图在题干和选项里就是同一个句柄，
    /// 提交时只上传一次。
    pub fn to_local_preview_with(
        content: &str,
        index: &AssetIndex,
        known: &mut HashMap<String, String>,
    ) -> PreviewOutcome {
        let mut registry_updates = HashMap::new();
        let mut unresolved: Vec<String> = Vec::new();

        let rewritten = IMG_SRC.replace_all(content, |caps: &Captures| {
            let (quote, src) = src_of(caps);
            if !is_relative_reference(src) {
                return caps[0].to_string();
            }

            let handle = match known.get(src) {
                Some(handle) => handle.clone(),
                None => {
                    let Some(file) = index.find(&decode_entities(src)) else {
                        if !unresolved.iter().any(|u| u == src) {
                            unresolved.push(src.to_string());
                        }
                        return caps[0].to_string();
                    };
                    let handle = BlobFileRegistry::mint_handle();
                    debug!("{} → {} ({})", src, handle, file.relative_path);
                    registry_updates.insert(handle.clone(), file);
                    known.insert(src.to_string(), handle.clone());
                    handle
                }
            };
            format!("{}{}{}{}", &caps[1], quote, handle, quote)
        });

        PreviewOutcome {
            content: rewritten.into_owned(),
            registry_updates,
            unresolved,
        }
    }

    /// 人工替换一张图：把内容里所有等于 `old` 的图片引用换成 `new`
    ///
    /// 属性值按解码后的路径比较，`a&amp;b.png` 等于 `a&b.png`。
    /// 题干、每个选项、解析是独立的字符串，需要分别调用。
    pub fn replace_one(content: &str, old_handle_or_path: &str, new_ephemeral_handle: &str) -> String {
        IMG_SRC
            .replace_all(content, |caps: &Captures| {
                let (quote, src) = src_of(caps);
                if src == old_handle_or_path || decode_entities(src) == old_handle_or_path {
                    format!("{}{}{}{}", &caps[1], quote, new_ephemeral_handle, quote)
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned()
    }

    /// 临时句柄 → 持久地址
    ///
    /// 内容中每个登记过、且本次尚未处理的句柄上传一次，然后替换它的所有出现位置。
    /// 未登记或上传失败的句柄记入 `pass` 并保持原样，不影响其余句柄。
    pub async fn resolve_to_durable(
        &self,
        content: &str,
        registry: &BlobFileRegistry,
        pass: &mut ResolutionPass,
    ) -> String {
        let pending: Vec<String> = ephemeral_handles(content)
            .into_iter()
            .filter(|h| !pass.is_settled(h))
            .collect();
        self.upload_pending(pending, registry, pass).await;
        pass.rewrite(content)
    }

    /// 解析一个草稿的全部字段
    ///
    /// 先收集所有字段里的句柄并发上传，再逐个字段改写，保证同一句柄只上传一次、
    /// 各处得到相同的地址。
    pub async fn resolve_draft(
        &self,
        draft: &QuestionDraft,
        registry: &BlobFileRegistry,
    ) -> (QuestionDraft, ResolutionPass) {
        let mut pass = ResolutionPass::new();

        let mut pending: Vec<String> = Vec::new();
        for field in draft.fields() {
            for handle in ephemeral_handles(field) {
                if !pending.contains(&handle) {
                    pending.push(handle);
                }
            }
        }
        self.upload_pending(pending, registry, &mut pass).await;

        let mut resolved = draft.clone();
        resolved.content = self
            .resolve_to_durable(&draft.content, registry, &mut pass)
            .await;
        for option in resolved.options.iter_mut() {
            option.content = self
                .resolve_to_durable(&option.content, registry, &mut pass)
                .await;
        }
        resolved.explanation = self
            .resolve_to_durable(&draft.explanation, registry, &mut pass)
            .await;

        (resolved, pass)
    }

    async fn upload_pending(
        &self,
        pending: Vec<String>,
        registry: &BlobFileRegistry,
        pass: &mut ResolutionPass,
    ) {
        if pending.is_empty() {
            return;
        }

        let mut uploads = Vec::new();
        for handle in pending {
            match registry.get(&handle) {
                Some(file) => uploads.push((handle, file.clone())),
                None => {
                    warn!("⚠️ 临时句柄未登记，保持原样: {}", handle);
                    pass.failed.insert(
                        handle.clone(),
                        DraftIssue::UnregisteredAsset { handle },
                    );
                }
            }
        }

        pass.uploads += uploads.len();
        let results: Vec<_> = stream::iter(uploads)
            .map(|(handle, file)| async move {
                let result = self
                    .uploader
                    .upload_asset(&file, &self.destination_hint)
                    .await;
                (handle, file, result)
            })
            .buffer_unordered(self.max_concurrent_uploads)
            .collect()
            .await;

        for (handle, file, result) in results {
            match result {
                Ok(location) => {
                    info!("✓ 图片已上传: {} → {}", file.relative_path, location);
                    pass.resolved.insert(handle, location);
                }
                Err(e) => {
                    warn!("⚠️ 图片上传失败 {}: {}", file.relative_path, e);
                    pass.failed.insert(
                        handle.clone(),
                        DraftIssue::UploadFailure {
                            handle,
                            reason: e.to_string(),
                        },
                    );
                }
            }
        }
    }
}

fn src_of<'c>(caps: &'c Captures) -> (char, &'c str) {
    match caps.get(2) {
        Some(m) => ('"', m.as_str()),
        None => ('\'', caps.get(3).map_or("", |m| m.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::models::{LocalFile, OptionDraft};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 记录上传次数；文件名含 "broken" 的上传失败
    #[derive(Default)]
    struct CountingUploader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AssetUploader for CountingUploader {
        async fn upload_asset(&self, file: &LocalFile, destination_hint: &str) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if file.relative_path.contains("broken") {
                return Err(AppError::upload_rejected(&file.relative_path, Some(500), None));
            }
            Ok(format!("https://cdn.example.com/{}/{}", destination_hint, file.file_name()))
        }
    }

    fn index() -> AssetIndex {
        AssetIndex::build(vec![
            LocalFile::new("folder/sub/img1.png", "/tmp/folder/sub/img1.png"),
            LocalFile::new("folder/broken.png", "/tmp/folder/broken.png"),
        ])
    }

    fn resolver() -> (Arc<CountingUploader>, AssetResolver) {
        let uploader = Arc::new(CountingUploader::default());
        let resolver = AssetResolver::new(uploader.clone(), "quiz", 4);
        (uploader, resolver)
    }

    #[test]
    fn test_preview_rewrites_only_resolvable_relative_paths() {
        let content = r#"<p><img src="sub/img1.png" /><img src="missing.png" /><img src="https://x/y.png" /></p>"#;
        let outcome = AssetResolver::to_local_preview(content, &index());

        assert_eq!(outcome.registry_updates.len(), 1);
        let (handle, file) = outcome.registry_updates.iter().next().unwrap();
        assert_eq!(file.relative_path, "folder/sub/img1.png");
        assert!(outcome.content.contains(&format!(r#"<img src="{}" />"#, handle)));
        assert!(outcome.content.contains(r#"<img src="missing.png" />"#));
        assert!(outcome.content.contains(r#"<img src="https://x/y.png" />"#));
        assert_eq!(outcome.unresolved, vec!["missing.png"]);
    }

    #[test]
    fn test_preview_reuses_handle_for_same_path() {
        let mut known = HashMap::new();
        let first = AssetResolver::to_local_preview_with(r#"<img src="sub/img1.png">"#, &index(), &mut known);
        let second = AssetResolver::to_local_preview_with(r#"<img src='sub/img1.png'>"#, &index(), &mut known);
        assert_eq!(first.registry_updates.len(), 1);
        assert!(second.registry_updates.is_empty());
        let handle = first.registry_updates.keys().next().unwrap();
        assert_eq!(second.content, format!("<img src='{}'>", handle));
    }

    #[test]
    fn test_replace_one_updates_every_occurrence() {
        let content = r#"<img src="blob:old" /> và <img src="blob:old" /> <img src="blob:other" />"#;
        let out = AssetResolver::replace_one(content, "blob:old", "blob:new");
        assert_eq!(
            out,
            r#"<img src="blob:new" /> và <img src="blob:new" /> <img src="blob:other" />"#
        );
    }

    #[test]
    fn test_data_src_attribute_is_not_a_source() {
        let content = r#"<img data-src="sub/img1.png" src="missing.png" />"#;
        let outcome = AssetResolver::to_local_preview(content, &index());
        assert!(outcome.registry_updates.is_empty());
        assert_eq!(outcome.content, content);
        assert_eq!(outcome.unresolved, vec!["missing.png"]);

        let out = AssetResolver::replace_one(content, "sub/img1.png", "blob:new");
        assert_eq!(out, content);
    }

    #[test]
    fn test_replace_one_matches_entity_encoded_path() {
        let content = r#"<p><img src="a&amp;b.png" /></p>"#;
        let out = AssetResolver::replace_one(content, "a&b.png", "blob:new");
        assert_eq!(out, r#"<p><img src="blob:new" /></p>"#);
    }

    #[test]
    fn test_same_handle_in_three_fields_uploads_once() {
        let (uploader, resolver) = resolver();
        let mut registry = BlobFileRegistry::default();
        let handle = registry.register(index().find("sub/img1.png").unwrap());
        let img = format!(r#"<img src="{}" />"#, handle);

        let mut draft = QuestionDraft::new("q1", "Câu 1");
        draft.content = format!("<p>{}</p>", img);
        draft.options = vec![OptionDraft::new('A', img.clone()), OptionDraft::new('B', img.clone())];

        let (resolved, pass) = tokio_test::block_on(resolver.resolve_draft(&draft, &registry));

        assert_eq!(uploader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(pass.upload_count(), 1);
        let url = "https://cdn.example.com/quiz/img1.png";
        assert_eq!(resolved.content, format!(r#"<p><img src="{}" /></p>"#, url));
        for option in &resolved.options {
            assert_eq!(option.content, format!(r#"<img src="{}" />"#, url));
        }
        assert!(pass.issues().is_empty());
    }

    #[test]
    fn test_second_pass_over_durable_content_is_a_no_op() {
        let (uploader, resolver) = resolver();
        let mut registry = BlobFileRegistry::default();
        let handle = registry.register(index().find("sub/img1.png").unwrap());
        let content = format!(r#"<img src="{h}" /><img src="{h}" />"#, h = handle);

        let first = tokio_test::block_on(resolver.resolve_to_durable(
            &content,
            &registry,
            &mut ResolutionPass::new(),
        ));
        let second = tokio_test::block_on(resolver.resolve_to_durable(
            &first,
            &registry,
            &mut ResolutionPass::new(),
        ));

        assert_eq!(first, second);
        assert_eq!(uploader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_leave_references_untouched() {
        let (_, resolver) = resolver();
        let mut registry = BlobFileRegistry::default();
        let broken = registry.register(index().find("broken.png").unwrap());
        let good = registry.register(index().find("sub/img1.png").unwrap());
        let content = format!(
            r#"<img src="{}" /><img src="blob:quiz-import/unknown" /><img src="{}" /><img src="missing.png" />"#,
            broken, good
        );

        let mut pass = ResolutionPass::new();
        let out = tokio_test::block_on(resolver.resolve_to_durable(&content, &registry, &mut pass));

        assert!(out.contains(&broken));
        assert!(out.contains("blob:quiz-import/unknown"));
        assert!(out.contains("https://cdn.example.com/quiz/img1.png"));
        assert!(out.contains(r#"<img src="missing.png" />"#));
        assert!(!out.contains(&good));

        let issues = pass.issues();
        assert_eq!(issues.len(), 2);
        assert!(issues.contains(&DraftIssue::UnregisteredAsset {
            handle: "blob:quiz-import/unknown".into()
        }));
        assert!(issues
            .iter()
            .any(|i| matches!(i, DraftIssue::UploadFailure { handle, .. } if *handle == broken)));
    }
}
