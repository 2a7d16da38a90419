//! Archive service tests
//!
//! The Telegram client is replaced by mock `Forwarder`/`Notifier`
//! implementations, so these cover the real command semantics: batch
//! bounds, per-message failure tolerance, authorization, and code-mint
//! retries.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use vaultlink::config::{get_config, init_config};
use vaultlink::errors::{Result, VaultlinkError};
use vaultlink::services::archive::{ArchiveService, Forwarder, Notifier};
use vaultlink::services::{AdminStore, Shortener};
use vaultlink::storage::{ContentKind, ContentRecord, Storage};

const ADMIN_ID: i64 = 777;
const OUTSIDER_ID: i64 = 123;
const SOURCE_CHAT: i64 = 555;

// =============================================================================
// Mocks
// =============================================================================

/// In-memory store with an insert-attempt counter.
#[derive(Default)]
struct MemStorage {
    records: Mutex<HashMap<String, ContentRecord>>,
    insert_attempts: AtomicUsize,
}

#[async_trait]
impl Storage for MemStorage {
    async fn get(&self, code: &str) -> Result<Option<ContentRecord>> {
        Ok(self.records.lock().unwrap().get(code).cloned())
    }

    async fn insert(&self, record: ContentRecord) -> Result<()> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.records.lock().unwrap();
        if guard.contains_key(&record.code) {
            return Err(VaultlinkError::duplicate_code(record.code));
        }
        guard.insert(record.code.clone(), record);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<ContentRecord>> {
        let guard = self.records.lock().unwrap();
        let mut all: Vec<ContentRecord> = guard.values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(all)
    }

    async fn uploader_ids(&self) -> Result<Vec<i64>> {
        let guard = self.records.lock().unwrap();
        let mut ids: Vec<i64> = guard.values().map(|r| r.uploader_id).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    async fn backend_name(&self) -> String {
        "memory".to_string()
    }
}

/// Rejects the first `remaining` inserts with `DuplicateCode`.
struct CollidingStorage {
    inner: MemStorage,
    remaining: AtomicUsize,
}

impl CollidingStorage {
    fn failing(times: usize) -> Self {
        CollidingStorage {
            inner: MemStorage::default(),
            remaining: AtomicUsize::new(times),
        }
    }
}

#[async_trait]
impl Storage for CollidingStorage {
    async fn get(&self, code: &str) -> Result<Option<ContentRecord>> {
        self.inner.get(code).await
    }

    async fn insert(&self, record: ContentRecord) -> Result<()> {
        self.inner.insert_attempts.fetch_add(1, Ordering::SeqCst);
        if self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(VaultlinkError::duplicate_code(record.code));
        }
        let mut guard = self.inner.records.lock().unwrap();
        guard.insert(record.code.clone(), record);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<ContentRecord>> {
        self.inner.load_all().await
    }

    async fn uploader_ids(&self) -> Result<Vec<i64>> {
        self.inner.uploader_ids().await
    }

    async fn backend_name(&self) -> String {
        "memory".to_string()
    }
}

/// Archives message N as message N + 1000; configured ids fail.
struct MockForwarder {
    fail_ids: HashSet<i64>,
    calls: Mutex<Vec<i64>>,
}

impl MockForwarder {
    fn new() -> Self {
        MockForwarder {
            fail_ids: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_on(ids: &[i64]) -> Self {
        MockForwarder {
            fail_ids: ids.iter().copied().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<i64> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Forwarder for MockForwarder {
    async fn forward(&self, _from_chat: i64, message_id: i64) -> Result<i64> {
        self.calls.lock().unwrap().push(message_id);
        if self.fail_ids.contains(&message_id) {
            return Err(VaultlinkError::forward(format!(
                "message {} is gone",
                message_id
            )));
        }
        Ok(message_id + 1000)
    }
}

struct MockNotifier {
    fail_ids: HashSet<i64>,
    sent: Mutex<Vec<(i64, String)>>,
}

impl MockNotifier {
    fn new() -> Self {
        MockNotifier {
            fail_ids: HashSet::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn failing_on(ids: &[i64]) -> Self {
        MockNotifier {
            fail_ids: ids.iter().copied().collect(),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        if self.fail_ids.contains(&chat_id) {
            return Err(VaultlinkError::notify(format!("chat {} blocked us", chat_id)));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

// =============================================================================
// Setup
// =============================================================================

fn make_service(
    dir: &TempDir,
    storage: Arc<dyn Storage>,
    forwarder: Arc<MockForwarder>,
    notifier: Arc<MockNotifier>,
) -> ArchiveService {
    init_config();
    let admins = Arc::new(
        AdminStore::load(dir.path().join("admins.json"), &[ADMIN_ID]).unwrap(),
    );
    ArchiveService::new(
        storage,
        forwarder,
        notifier,
        Arc::new(Shortener::disabled()),
        admins,
    )
}

fn domain() -> String {
    get_config().links.public_domain.trim_end_matches('/').to_string()
}

// =============================================================================
// archive_single
// =============================================================================

#[tokio::test]
async fn test_archive_single_creates_record_and_link() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(MemStorage::default());
    let forwarder = Arc::new(MockForwarder::new());
    let service = make_service(
        &dir,
        storage.clone(),
        forwarder.clone(),
        Arc::new(MockNotifier::new()),
    );

    let url = service
        .archive_single(ADMIN_ID, SOURCE_CHAT, 42)
        .await
        .unwrap();

    let prefix = format!("{}/", domain());
    let code = url.strip_prefix(&prefix).expect("canonical share URL");
    assert_eq!(code.len(), 6);
    assert!(code.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));

    let records = storage.load_all().await.unwrap();
    assert_eq!(records.len(), 1);
    // locationRef is the archived copy's id, not the source id
    assert_eq!(records[0].kind, ContentKind::Single { message_id: 1042 });
    assert_eq!(records[0].uploader_id, ADMIN_ID);
    assert_eq!(forwarder.calls(), vec![42]);
}

#[tokio::test]
async fn test_archive_single_unauthorized() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(MemStorage::default());
    let forwarder = Arc::new(MockForwarder::new());
    let service = make_service(
        &dir,
        storage.clone(),
        forwarder.clone(),
        Arc::new(MockNotifier::new()),
    );

    let err = service
        .archive_single(OUTSIDER_ID, SOURCE_CHAT, 42)
        .await
        .unwrap_err();

    assert!(matches!(err, VaultlinkError::Unauthorized(_)));
    assert!(storage.load_all().await.unwrap().is_empty());
    assert!(forwarder.calls().is_empty());
}

#[tokio::test]
async fn test_archive_single_forward_failure_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(MemStorage::default());
    let forwarder = Arc::new(MockForwarder::failing_on(&[42]));
    let service = make_service(
        &dir,
        storage.clone(),
        forwarder,
        Arc::new(MockNotifier::new()),
    );

    let err = service
        .archive_single(ADMIN_ID, SOURCE_CHAT, 42)
        .await
        .unwrap_err();

    assert!(matches!(err, VaultlinkError::Forward(_)));
    assert!(storage.load_all().await.unwrap().is_empty());
}

// =============================================================================
// archive_batch
// =============================================================================

#[tokio::test]
async fn test_batch_tolerates_per_message_failures() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(MemStorage::default());
    let forwarder = Arc::new(MockForwarder::failing_on(&[103]));
    let service = make_service(
        &dir,
        storage.clone(),
        forwarder.clone(),
        Arc::new(MockNotifier::new()),
    );

    let url = service
        .archive_batch(ADMIN_ID, SOURCE_CHAT, 100, 105)
        .await
        .unwrap();
    assert!(url.starts_with(&domain()));

    // Every id attempted, in order, failure included
    assert_eq!(forwarder.calls(), vec![100, 101, 102, 103, 104, 105]);

    // Exactly one record, with the requested bounds
    let records = storage.load_all().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].kind,
        ContentKind::Batch {
            first_id: 100,
            last_id: 105
        }
    );
}

#[tokio::test]
async fn test_batch_rejects_inverted_range() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(MemStorage::default());
    let forwarder = Arc::new(MockForwarder::new());
    let service = make_service(
        &dir,
        storage.clone(),
        forwarder.clone(),
        Arc::new(MockNotifier::new()),
    );

    for (first, last) in [(105, 100), (100, 100)] {
        let err = service
            .archive_batch(ADMIN_ID, SOURCE_CHAT, first, last)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultlinkError::Validation(_)));
    }

    assert!(storage.load_all().await.unwrap().is_empty());
    assert!(forwarder.calls().is_empty());
}

#[tokio::test]
async fn test_batch_unauthorized() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(MemStorage::default());
    let forwarder = Arc::new(MockForwarder::new());
    let service = make_service(
        &dir,
        storage.clone(),
        forwarder.clone(),
        Arc::new(MockNotifier::new()),
    );

    let err = service
        .archive_batch(OUTSIDER_ID, SOURCE_CHAT, 100, 105)
        .await
        .unwrap_err();

    assert!(matches!(err, VaultlinkError::Unauthorized(_)));
    assert!(storage.load_all().await.unwrap().is_empty());
    assert!(forwarder.calls().is_empty());
}

// =============================================================================
// Code minting
// =============================================================================

#[tokio::test]
async fn test_mint_retries_on_collision() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(CollidingStorage::failing(2));
    let service = make_service(
        &dir,
        storage.clone(),
        Arc::new(MockForwarder::new()),
        Arc::new(MockNotifier::new()),
    );

    service
        .archive_single(ADMIN_ID, SOURCE_CHAT, 42)
        .await
        .expect("collision should be retried");

    assert_eq!(storage.inner.insert_attempts.load(Ordering::SeqCst), 3);
    assert_eq!(storage.load_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_mint_gives_up_after_bounded_attempts() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(CollidingStorage::failing(usize::MAX));
    let service = make_service(
        &dir,
        storage.clone(),
        Arc::new(MockForwarder::new()),
        Arc::new(MockNotifier::new()),
    );

    let err = service
        .archive_single(ADMIN_ID, SOURCE_CHAT, 42)
        .await
        .unwrap_err();

    assert!(matches!(err, VaultlinkError::DuplicateCode(_)));
    assert_eq!(storage.inner.insert_attempts.load(Ordering::SeqCst), 5);
}

// =============================================================================
// list_content
// =============================================================================

#[tokio::test]
async fn test_list_content_refreshes_share_urls() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(MemStorage::default());
    storage
        .insert(ContentRecord::single("aaa111", 42, ADMIN_ID))
        .await
        .unwrap();
    storage
        .insert(ContentRecord::batch("bbb222", 10, 20, ADMIN_ID))
        .await
        .unwrap();

    let service = make_service(
        &dir,
        storage,
        Arc::new(MockForwarder::new()),
        Arc::new(MockNotifier::new()),
    );

    let summaries = service.list_content(ADMIN_ID).await.unwrap();
    assert_eq!(summaries.len(), 2);
    for summary in &summaries {
        assert_eq!(summary.share_url, format!("{}/{}", domain(), summary.code));
    }
}

#[tokio::test]
async fn test_list_content_unauthorized() {
    let dir = TempDir::new().unwrap();
    let service = make_service(
        &dir,
        Arc::new(MemStorage::default()),
        Arc::new(MockForwarder::new()),
        Arc::new(MockNotifier::new()),
    );

    let err = service.list_content(OUTSIDER_ID).await.unwrap_err();
    assert!(matches!(err, VaultlinkError::Unauthorized(_)));
}

// =============================================================================
// broadcast
// =============================================================================

#[tokio::test]
async fn test_broadcast_targets_distinct_uploaders_and_skips_failures() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(MemStorage::default());
    storage
        .insert(ContentRecord::single("aaa111", 1, 111))
        .await
        .unwrap();
    storage
        .insert(ContentRecord::single("bbb222", 2, 111))
        .await
        .unwrap();
    storage
        .insert(ContentRecord::single("ccc333", 3, 222))
        .await
        .unwrap();
    storage
        .insert(ContentRecord::single("ddd444", 4, 333))
        .await
        .unwrap();

    let notifier = Arc::new(MockNotifier::failing_on(&[222]));
    let service = make_service(
        &dir,
        storage,
        Arc::new(MockForwarder::new()),
        notifier.clone(),
    );

    let sent = service.broadcast(ADMIN_ID, "maintenance tonight").await.unwrap();
    assert_eq!(sent, 2);

    let deliveries = notifier.sent();
    assert_eq!(deliveries.len(), 2);
    assert!(deliveries.contains(&(111, "maintenance tonight".to_string())));
    assert!(deliveries.contains(&(333, "maintenance tonight".to_string())));
}

#[tokio::test]
async fn test_broadcast_unauthorized_sends_nothing() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(MemStorage::default());
    storage
        .insert(ContentRecord::single("aaa111", 1, 111))
        .await
        .unwrap();

    let notifier = Arc::new(MockNotifier::new());
    let service = make_service(
        &dir,
        storage,
        Arc::new(MockForwarder::new()),
        notifier.clone(),
    );

    let err = service.broadcast(OUTSIDER_ID, "hi").await.unwrap_err();
    assert!(matches!(err, VaultlinkError::Unauthorized(_)));
    assert!(notifier.sent().is_empty());
}

// =============================================================================
// Admin allow-list operations
// =============================================================================

#[tokio::test]
async fn test_admin_mutations_gated_and_consistent() {
    let dir = TempDir::new().unwrap();
    let service = make_service(
        &dir,
        Arc::new(MemStorage::default()),
        Arc::new(MockForwarder::new()),
        Arc::new(MockNotifier::new()),
    );

    // Outsider cannot touch the allow-list
    assert!(matches!(
        service.add_admin(OUTSIDER_ID, 999).unwrap_err(),
        VaultlinkError::Unauthorized(_)
    ));
    assert_eq!(service.list_admins(ADMIN_ID).unwrap(), vec![ADMIN_ID]);

    // Admin mutations report whether anything changed
    assert!(service.add_admin(ADMIN_ID, 999).unwrap());
    assert!(!service.add_admin(ADMIN_ID, 999).unwrap());
    assert_eq!(service.list_admins(ADMIN_ID).unwrap(), vec![ADMIN_ID, 999]);

    assert!(service.remove_admin(ADMIN_ID, 999).unwrap());
    assert!(!service.remove_admin(ADMIN_ID, 999).unwrap());
    assert_eq!(service.list_admins(ADMIN_ID).unwrap(), vec![ADMIN_ID]);
}
