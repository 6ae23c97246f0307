use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use quiz_import::assets::ephemeral_handles;
use quiz_import::config::Config;
use quiz_import::error::{AppError, AppResult};
use quiz_import::markup::HtmlTree;
use quiz_import::models::{
    load_local_files, pick_markup_document, read_markup_document, DraftIssue, DraftStatus,
    LocalFile, PoolAssignment, QuestionRecord,
};
use quiz_import::orchestrator::ImportOrchestrator;
use quiz_import::services::{AssetUploader, QuestionStore};

const DOCUMENT: &str = r#"<html><body>
<p>Câu 1: Thủ đô của Pháp là gì?</p>
<p>A. Paris B. London C. Rome D. Berlin</p>
<p>Lời giải</p>
<p>Chọn A</p>
<p>Câu 2: Hình nào dưới đây?</p>
<p><img src="sub/img1.png"></p>
<p>A. <img src="sub/img1.png"> B. Không có</p>
<p>Hướng dẫn giải</p>
<p>Đáp án: A</p>
<p>Xem <img src="sub/img1.png"></p>
</body></html>"#;

/// 按文件名返回固定地址，并统计每个文件的上传次数
#[derive(Default)]
struct FakeUploader {
    calls: Mutex<HashMap<String, usize>>,
}

#[async_trait]
impl AssetUploader for FakeUploader {
    async fn upload_asset(&self, file: &LocalFile, destination_hint: &str) -> AppResult<String> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(file.relative_path.clone())
            .or_default() += 1;
        Ok(format!("https://cdn.test/{}/{}", destination_hint, file.file_name()))
    }
}

/// 保存记录；`fail_label` 对应的题目返回错误
struct FakeStore {
    records: Mutex<Vec<QuestionRecord>>,
    next_id: AtomicUsize,
    fail_label: Option<String>,
}

impl FakeStore {
    fn new(fail_label: Option<&str>) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            fail_label: fail_label.map(String::from),
        }
    }
}

#[async_trait]
impl QuestionStore for FakeStore {
    async fn persist_question_record(&self, record: &QuestionRecord) -> AppResult<String> {
        if self.fail_label.as_deref() == Some(record.label.as_str()) {
            return Err(AppError::store_rejected(&record.collection, Some(500), None));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
    }
}

fn test_config() -> Config {
    Config {
        review_file: String::new(),
        asset_destination: "quiz".to_string(),
        ..Config::default()
    }
}

fn files() -> Vec<LocalFile> {
    vec![
        LocalFile::new("folder/de.html", "/tmp/folder/de.html"),
        LocalFile::new("folder/sub/img1.png", "/tmp/folder/sub/img1.png"),
    ]
}

#[tokio::test]
async fn test_end_to_end_import() {
    let uploader = Arc::new(FakeUploader::default());
    let store = Arc::new(FakeStore::new(None));
    let orchestrator = ImportOrchestrator::new(test_config(), uploader.clone(), store.clone());

    // 预览：相对路径变成临时句柄
    let session = orchestrator.prepare(HtmlTree, DOCUMENT, files());
    let drafts = session.drafts();
    assert_eq!(drafts.len(), 2);

    let q2 = &drafts[1];
    assert!(!q2.content.contains("sub/img1.png"));
    let handles = ephemeral_handles(&q2.content);
    assert_eq!(handles.len(), 1);
    assert_eq!(
        session.registry().get(&handles[0]).unwrap().relative_path,
        "folder/sub/img1.png"
    );

    // 提交：每个文件只上传一次，所有出现位置都换成持久地址
    let pool = PoolAssignment::new("pool-1");
    let report = orchestrator.commit(&session, "questions", &pool).await;

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.entries[0].local_id, "q1");
    assert_eq!(report.entries[1].local_id, "q2");
    assert_eq!(uploader.calls.lock().unwrap()["folder/sub/img1.png"], 1);

    let records = store.records.lock().unwrap();
    let q2 = records.iter().find(|r| r.label == "Câu 2").unwrap();
    let url = "https://cdn.test/quiz/img1.png";
    assert!(q2.content.contains(url));
    assert!(q2.options[0].content.contains(url));
    assert!(q2.explanation.contains(url));
    assert!(!q2.content.contains("blob:"));
    assert_eq!(q2.correct_answer, "A");
    assert!(q2.options[0].is_correct);
    assert_eq!(q2.pool.pool_id, "pool-1");

    let q1 = records.iter().find(|r| r.label == "Câu 1").unwrap();
    let labels: Vec<&str> = q1.options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["A", "B", "C", "D"]);
    assert_eq!(q1.options[0].content, "Paris");
}

#[tokio::test]
async fn test_one_failing_draft_does_not_stop_the_others() {
    let uploader = Arc::new(FakeUploader::default());
    let store = Arc::new(FakeStore::new(Some("Câu 1")));
    let orchestrator = ImportOrchestrator::new(test_config(), uploader, store.clone());

    let report = orchestrator
        .import(HtmlTree, DOCUMENT, files(), "questions", &PoolAssignment::new("p"))
        .await;

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert!(matches!(report.entries[0].status, DraftStatus::Failed { .. }));
    assert!(report.entries[0]
        .issues
        .iter()
        .any(|i| matches!(i, DraftIssue::PersistenceFailure { .. })));
    assert!(report.entries[1].is_imported());
    assert_eq!(store.records.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_image_is_flagged_and_left_untouched() {
    let uploader = Arc::new(FakeUploader::default());
    let store = Arc::new(FakeStore::new(None));
    let orchestrator = ImportOrchestrator::new(test_config(), uploader.clone(), store.clone());

    let only_document = vec![LocalFile::new("folder/de.html", "/tmp/folder/de.html")];
    let report = orchestrator
        .import(HtmlTree, DOCUMENT, only_document, "questions", &PoolAssignment::new("p"))
        .await;

    assert_eq!(report.succeeded, 2);
    assert!(report.entries[1].issues.contains(&DraftIssue::AssetNotFound {
        reference: "sub/img1.png".into()
    }));
    assert!(uploader.calls.lock().unwrap().is_empty());

    let records = store.records.lock().unwrap();
    let q2 = records.iter().find(|r| r.label == "Câu 2").unwrap();
    assert!(q2.content.contains(r#"<img src="sub/img1.png" />"#));
}

#[tokio::test]
async fn test_reviewer_replaces_image_before_commit() {
    let uploader = Arc::new(FakeUploader::default());
    let store = Arc::new(FakeStore::new(None));
    let orchestrator = ImportOrchestrator::new(test_config(), uploader.clone(), store.clone());

    let mut session = orchestrator.prepare(HtmlTree, DOCUMENT, files());
    let old = ephemeral_handles(&session.drafts()[1].content)[0].clone();
    session
        .replace_image("q2", &old, LocalFile::new("better.png", "/tmp/better.png"))
        .unwrap();

    orchestrator
        .commit(&session, "questions", &PoolAssignment::new("p"))
        .await;

    let calls = uploader.calls.lock().unwrap();
    assert_eq!(calls.get("better.png"), Some(&1));
    assert!(calls.get("folder/sub/img1.png").is_none());

    let records = store.records.lock().unwrap();
    let q2 = records.iter().find(|r| r.label == "Câu 2").unwrap();
    assert!(q2.content.contains("https://cdn.test/quiz/better.png"));
    assert!(q2.explanation.contains("https://cdn.test/quiz/better.png"));
}

#[tokio::test]
async fn test_load_folder_and_pick_document() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("de.html"), DOCUMENT).unwrap();
    std::fs::write(dir.path().join("sub").join("img1.png"), [0u8; 4]).unwrap();

    let files = load_local_files(&dir.path().to_string_lossy()).await.unwrap();
    let document = pick_markup_document(&files, None).unwrap();
    assert_eq!(document.relative_path, "de.html");

    let markup = read_markup_document(document).await.unwrap();
    let uploader = Arc::new(FakeUploader::default());
    let store = Arc::new(FakeStore::new(None));
    let orchestrator = ImportOrchestrator::new(test_config(), uploader.clone(), store);

    let report = orchestrator
        .import(HtmlTree, &markup, files, "questions", &PoolAssignment::new("p"))
        .await;
    assert_eq!(report.succeeded, 2);
    assert_eq!(uploader.calls.lock().unwrap()["sub/img1.png"], 1);
}
