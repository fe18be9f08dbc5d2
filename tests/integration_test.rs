use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use page_organizer::clients::DocumentBackend;
use page_organizer::config::Config;
use page_organizer::error::{AppError, AppResult};
use page_organizer::models::document::{DocumentDetails, RecipeEntry, UploadedDocument};
use page_organizer::models::{load_toml_to_edit_plan, PlanOperation};
use page_organizer::orchestrator::{apply_operation, process_plan};
use page_organizer::organizer::{EditOutcome, OrganizeError, PageSelection};
use page_organizer::utils::logging;
use page_organizer::workflow::{DocumentSession, ExitDecision, SessionError};
use tokio_test::{assert_err, assert_ok};

/// 内存中的文档服务
#[derive(Default)]
struct FakeBackend {
    documents: Mutex<HashMap<String, DocumentDetails>>,
    organized: Mutex<Vec<(String, Vec<RecipeEntry>)>>,
    deleted: Mutex<Vec<String>>,
    fail_organize: AtomicBool,
    uploads: AtomicUsize,
}

impl FakeBackend {
    fn with_document(id: &str, name: &str, file_type: &str, total_pages: usize) -> Self {
        let backend = Self::default();
        backend.add_document(id, name, file_type, total_pages);
        backend
    }

    fn add_document(&self, id: &str, name: &str, file_type: &str, total_pages: usize) {
        let details: DocumentDetails = serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "fileType": file_type,
            "size": 1024,
            "totalPages": total_pages,
        }))
        .unwrap();
        self.documents.lock().unwrap().insert(id.to_string(), details);
    }

    fn organized(&self) -> Vec<(String, Vec<RecipeEntry>)> {
        self.organized.lock().unwrap().clone()
    }
}

impl DocumentBackend for FakeBackend {
    async fn get_document(&self, document_id: &str) -> AppResult<DocumentDetails> {
        self.documents
            .lock()
            .unwrap()
            .get(document_id)
            .cloned()
            .ok_or_else(|| {
                AppError::bad_response(format!("/documents/{}", document_id), 404, None)
            })
    }

    async fn fetch_page(&self, document_id: &str, page_number: usize) -> AppResult<Vec<u8>> {
        Ok(format!("{}:{}", document_id, page_number).into_bytes())
    }

    async fn upload_document(&self, file_name: &str, bytes: Vec<u8>) -> AppResult<UploadedDocument> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("upload-{}", n);
        // 测试约定：文件内容就是页数
        let total_pages: usize = String::from_utf8_lossy(&bytes).trim().parse().unwrap_or(1);
        self.add_document(&id, file_name, "application/pdf", total_pages);
        Ok(serde_json::from_value(serde_json::json!({
            "id": id,
            "name": file_name,
            "totalPages": total_pages,
        }))?)
    }

    async fn organize(
        &self,
        document_id: &str,
        recipe: &[RecipeEntry],
    ) -> AppResult<UploadedDocument> {
        let endpoint = format!("/documents/{}/organize", document_id);
        if self.fail_organize.load(Ordering::SeqCst) {
            return Err(AppError::bad_response(endpoint, 500, Some("render failed".into())));
        }
        self.organized
            .lock()
            .unwrap()
            .push((document_id.to_string(), recipe.to_vec()));
        Ok(serde_json::from_value(serde_json::json!({
            "id": format!("{}-v2", document_id),
            "name": "organized.pdf",
            "totalPages": recipe.len(),
        }))?)
    }

    async fn delete_document(&self, document_id: &str) -> AppResult<()> {
        self.deleted.lock().unwrap().push(document_id.to_string());
        Ok(())
    }

    fn page_url(&self, document_id: &str, page_number: usize) -> String {
        format!("mem://{}/{}", document_id, page_number)
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("page_organizer_it_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn test_open_refuses_non_pdf_documents() {
    let backend = FakeBackend::with_document("img", "photo.png", "image/png", 1);
    let err = DocumentSession::open(&backend, "img", 0).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Session(SessionError::NotOrganizable { .. })
    ));

    let missing = DocumentSession::open(&backend, "nope", 0).await.unwrap_err();
    assert!(missing.is_backend());
}

#[tokio::test]
async fn test_save_sends_recipe_and_marks_clean() {
    let backend = FakeBackend::with_document("doc", "report.pdf", "application/pdf", 3);
    let mut session = assert_ok!(DocumentSession::open(&backend, "doc", 0).await);
    assert_eq!(session.request_exit(), ExitDecision::Leave);

    let editor = session.organizer_mut();
    let second = editor.uid_at(2).unwrap();
    assert_ok!(editor.rotate(second, 90));
    assert_ok!(editor.delete(editor.uid_at(1).unwrap()));
    assert_eq!(session.request_exit(), ExitDecision::ConfirmDiscard);

    let saved = assert_ok!(session.save(&backend).await);
    assert_eq!(saved.id, "doc-v2");
    assert!(!session.is_dirty());
    assert!(session.organizer().can_undo());
    assert_eq!(session.last_saved().map(|d| d.id.as_str()), Some("doc-v2"));
    assert_eq!(session.request_exit(), ExitDecision::Leave);

    let organized = backend.organized();
    assert_eq!(organized.len(), 1);
    let indices: Vec<(usize, u16)> = organized[0]
        .1
        .iter()
        .map(|r| (r.source_page_index, r.rotation.degrees()))
        .collect();
    assert_eq!(indices, vec![(1, 90), (2, 0)]);
}

#[tokio::test]
async fn test_failed_save_keeps_edits_for_retry() {
    let backend = FakeBackend::with_document("doc", "report.pdf", "application/pdf", 2);
    backend.fail_organize.store(true, Ordering::SeqCst);
    let mut session = DocumentSession::open(&backend, "doc", 0).await.unwrap();

    let first = session.organizer().uid_at(1).unwrap();
    session.organizer_mut().duplicate(first).unwrap();
    let before = session.organizer().pages().to_vec();

    let err = assert_err!(session.save(&backend).await);
    assert!(err.is_backend());
    assert!(session.is_dirty());
    assert!(session.organizer().can_undo());
    assert_eq!(session.organizer().pages(), before.as_slice());
    assert!(!session.is_saving());

    backend.fail_organize.store(false, Ordering::SeqCst);
    assert_ok!(session.save(&backend).await);
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn test_only_one_save_in_flight() {
    let backend = FakeBackend::with_document("doc", "report.pdf", "application/pdf", 2);
    let mut session = DocumentSession::open(&backend, "doc", 0).await.unwrap();
    let first = session.organizer().uid_at(1).unwrap();
    session.organizer_mut().rotate(first, 180).unwrap();

    let pending = session.begin_save().unwrap();
    assert!(session.is_saving());
    assert_eq!(
        session.begin_save().unwrap_err(),
        SessionError::RequestInFlight { operation: "保存" }
    );
    assert!(session.discard().is_err());

    let result = pending.send(&backend).await;
    assert_ok!(session.finish_save(pending, result));
    assert!(!session.is_saving());
    assert_ok!(session.begin_save());
}

#[tokio::test]
async fn test_edits_during_save_stay_dirty() {
    let backend = FakeBackend::with_document("doc", "report.pdf", "application/pdf", 2);
    let mut session = DocumentSession::open(&backend, "doc", 0).await.unwrap();
    let first = session.organizer().uid_at(1).unwrap();
    session.organizer_mut().rotate(first, 90).unwrap();

    let pending = session.begin_save().unwrap();
    assert_eq!(pending.recipe().len(), 2);
    session.organizer_mut().rotate(first, 90).unwrap();

    let result = pending.send(&backend).await;
    assert_ok!(session.finish_save(pending, result));
    assert!(session.is_dirty());
    assert_eq!(backend.organized()[0].1[0].rotation.degrees(), 90);
}

#[tokio::test]
async fn test_insert_flow_with_range() {
    let backend = FakeBackend::with_document("doc", "report.pdf", "application/pdf", 2);
    let mut session = DocumentSession::open(&backend, "doc", 0).await.unwrap();

    let pending = assert_ok!(session.begin_insert(&backend, "src.pdf", b"6".to_vec(), 2).await);
    assert_eq!(pending.total_pages, 6);
    assert!(!pending.is_single_page());

    // 同时只允许一个上传
    let err = assert_err!(session.begin_insert(&backend, "other.pdf", b"2".to_vec(), 1).await);
    assert!(matches!(
        err,
        AppError::Session(SessionError::RequestInFlight { .. })
    ));

    // 无效范围：返回原请求，状态不变
    let rejected = session
        .confirm_insert(pending, &PageSelection::Range("9".to_string()))
        .unwrap_err();
    assert_eq!(rejected.error.reason_code(), "empty_page_selection");
    assert_eq!(session.organizer().visible_count(), 2);
    assert!(!session.is_dirty());

    let uids = session
        .confirm_insert(rejected.pending, &PageSelection::Range("1-2,5".to_string()))
        .unwrap();
    assert_eq!(uids.len(), 3);

    let inserted: Vec<usize> = session
        .organizer()
        .visible_pages()
        .filter(|p| p.is_inserted())
        .map(|p| p.source_page_index)
        .collect();
    assert_eq!(inserted, vec![0, 1, 4]);
    assert_eq!(session.organizer().uid_at(2), Some(uids[0]));

    // 上传许可已释放
    assert_ok!(session.begin_insert(&backend, "again.pdf", b"1".to_vec(), 1).await);
}

#[tokio::test]
async fn test_single_page_insert_ignores_selection() {
    let backend = FakeBackend::with_document("doc", "report.pdf", "application/pdf", 1);
    let mut session = DocumentSession::open(&backend, "doc", 0).await.unwrap();

    let pending = session.begin_insert(&backend, "one.pdf", b"1".to_vec(), 9).await.unwrap();
    assert!(pending.is_single_page());
    let uids = session
        .confirm_insert(pending, &PageSelection::Range("garbage".to_string()))
        .unwrap();
    assert_eq!(uids.len(), 1);
    assert_eq!(session.organizer().uid_at(2), Some(uids[0]));
}

#[tokio::test]
async fn test_delete_all_escape_hatch() {
    let backend = FakeBackend::with_document("doc", "report.pdf", "application/pdf", 1);
    let mut session = DocumentSession::open(&backend, "doc", 0).await.unwrap();

    let only = session.organizer().uid_at(1).unwrap();
    let refusal = session.organizer_mut().delete(only).unwrap_err();
    assert_eq!(refusal, OrganizeError::CannotDeleteAllPages { remaining: 1 });

    assert_ok!(session.delete_whole_document(&backend).await);
    assert_eq!(backend.deleted.lock().unwrap().clone(), vec!["doc".to_string()]);
}

#[tokio::test]
async fn test_discard_resets_to_opened_state() {
    let backend = FakeBackend::with_document("doc", "report.pdf", "application/pdf", 3);
    let mut session = DocumentSession::open(&backend, "doc", 0).await.unwrap();
    let opened: Vec<usize> = session
        .organizer()
        .pages()
        .iter()
        .map(|p| p.source_page_index)
        .collect();

    session.organizer_mut().select_all(true);
    session.organizer_mut().bulk_duplicate();
    assert!(session.is_dirty());

    assert_ok!(session.discard());
    assert!(!session.is_dirty());
    assert!(!session.organizer().can_undo());
    let now: Vec<usize> = session
        .organizer()
        .pages()
        .iter()
        .map(|p| p.source_page_index)
        .collect();
    assert_eq!(now, opened);
}

#[tokio::test]
async fn test_discard_never_reissues_old_uids() {
    let backend = FakeBackend::with_document("doc", "report.pdf", "application/pdf", 3);
    let mut session = DocumentSession::open(&backend, "doc", 0).await.unwrap();

    let pending = session.begin_insert(&backend, "one.pdf", b"1".to_vec(), 2).await.unwrap();
    let stale = session
        .confirm_insert(pending, &PageSelection::All)
        .unwrap()[0];

    assert_ok!(session.discard());
    assert!(session.organizer().page(stale).is_none());

    let editor = session.organizer_mut();
    let copy = editor.duplicate(editor.uid_at(1).unwrap()).unwrap();
    assert_ne!(copy, stale);
    assert_eq!(assert_ok!(editor.rotate(stale, 90)), EditOutcome::Unchanged);
    assert!(editor.pages().iter().all(|p| p.rotation.degrees() == 0));
}

#[tokio::test]
async fn test_thumbnails_follow_order_and_rotation() {
    let backend = FakeBackend::with_document("doc", "report.pdf", "application/pdf", 3);
    let mut session = DocumentSession::open(&backend, "doc", 0).await.unwrap();
    let editor = session.organizer_mut();
    let third = editor.uid_at(3).unwrap();
    let first = editor.uid_at(1).unwrap();
    editor.rotate(third, 270).unwrap();
    editor.reorder(third, first);

    let thumbs = session.thumbnails(&backend);
    let urls: Vec<&str> = thumbs.iter().map(|t| t.url.as_str()).collect();
    assert_eq!(urls, vec!["mem://doc/3", "mem://doc/1", "mem://doc/2"]);
    assert_eq!(thumbs[0].rotation.degrees(), 270);
    assert_eq!(thumbs[0].display_index, 1);

    let bytes = session.load_thumbnail(&backend, third).await.unwrap();
    assert_eq!(bytes, Some(b"doc:3".to_vec()));
}

#[tokio::test]
async fn test_apply_operation_reports_refusals_as_validation() {
    let backend = FakeBackend::with_document("doc", "report.pdf", "application/pdf", 2);
    let mut session = DocumentSession::open(&backend, "doc", 0).await.unwrap();
    let base = PathBuf::new();

    let op = PlanOperation::SelectAll { selected: true };
    assert_eq!(apply_operation(&backend, &mut session, &op, &base).await.unwrap(), false);

    let err = apply_operation(&backend, &mut session, &PlanOperation::BulkDelete, &base)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let op = PlanOperation::Rotate { page: 7, angle: 90 };
    assert_eq!(apply_operation(&backend, &mut session, &op, &base).await.unwrap(), false);

    // 第 1 页切换两次回到未选中
    let op = PlanOperation::SelectAll { selected: false };
    apply_operation(&backend, &mut session, &op, &base).await.unwrap();
    let op = PlanOperation::ToggleSelect { pages: vec![1, 2, 1] };
    assert_eq!(apply_operation(&backend, &mut session, &op, &base).await.unwrap(), false);
    let selected: Vec<bool> = session.organizer().visible_pages().map(|p| p.selected).collect();
    assert_eq!(selected, vec![false, true]);
}

#[tokio::test]
async fn test_process_plan_end_to_end() {
    logging::init(false);

    let dir = temp_dir("plan");
    std::fs::write(dir.join("appendix.pdf"), "6").unwrap();
    let plan_path = dir.join("plan.toml");
    std::fs::write(
        &plan_path,
        r#"
document_id = "doc"
name = "季度报告整理"

[[operations]]
op = "rotate"
page = 1
angle = 90

[[operations]]
op = "insert"
at = 3
file = "appendix.pdf"
pages = "1-2,5"

[[operations]]
op = "delete"
page = 2

[[operations]]
op = "select_all"

[[operations]]
op = "bulk_delete"

[[operations]]
op = "move"
page = 4
to = 1
"#,
    )
    .unwrap();

    let backend = FakeBackend::with_document("doc", "report.pdf", "application/pdf", 2);
    let plan = load_toml_to_edit_plan(&plan_path).await.unwrap();
    let stats = process_plan(&backend, plan, 1, &Config::default())
        .await
        .unwrap();

    assert_eq!(stats.applied, 4);
    assert_eq!(stats.unchanged, 1);
    assert_eq!(stats.refused, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.saved_document_id.as_deref(), Some("doc-v2"));

    let organized = backend.organized();
    let recipe: Vec<(String, usize, u16)> = organized[0]
        .1
        .iter()
        .map(|r| (r.source_document_id.clone(), r.source_page_index, r.rotation.degrees()))
        .collect();
    assert_eq!(
        recipe,
        vec![
            ("upload-1".to_string(), 4, 0),
            ("doc".to_string(), 0, 90),
            ("upload-1".to_string(), 0, 0),
            ("upload-1".to_string(), 1, 0),
        ]
    );

    assert!(!plan_path.exists());
    assert!(dir.join("plan.toml.done").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
#[ignore] // 默认忽略，需要运行中的文档服务：cargo test -- --ignored
async fn test_open_live_document() {
    logging::init(true);

    let config = Config::from_env();
    let client = page_organizer::DocumentClient::new(&config).expect("创建客户端失败");
    let id = std::env::var("TEST_DOCUMENT_ID").expect("需要设置 TEST_DOCUMENT_ID");

    let session = DocumentSession::open(&client, &id, config.history_limit)
        .await
        .expect("打开文档失败");
    assert!(session.organizer().visible_count() > 0);
}
