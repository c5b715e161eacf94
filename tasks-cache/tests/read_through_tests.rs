//! Integration tests for the read-through cache
//!
//! These tests verify the complete caching behaviour including:
//! - Key shape and canonical list keys
//! - Hit/miss transparency
//! - Generation invalidation on mutations
//! - Fail-open handling of key-value faults
//! - No caching of failed outcomes

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tasks_cache::cache::{CacheConfig, CacheSource, CachedRecords, WriteMode};
use tasks_cache::kv::{KvStore, MemoryKv};
use tasks_cache::{CacheError, Outcome, RecordStore, Result};

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Wraps a MemoryKv and fails selected calls on demand
#[derive(Clone, Default)]
struct FaultyKv {
    inner: MemoryKv,
    fail_get: Arc<AtomicBool>,
    fail_put: Arc<AtomicBool>,
    fail_version_put: Arc<AtomicBool>,
    fail_entry_get: Arc<AtomicBool>,
    /// Number of upcoming version reads to fail
    failing_version_gets: Arc<AtomicUsize>,
    ttls: Arc<Mutex<HashMap<String, Option<Duration>>>>,
}

impl FaultyKv {
    fn new() -> Self {
        Self::default()
    }

    fn ttl_of(&self, key: &str) -> Option<Option<Duration>> {
        self.ttls.lock().unwrap().get(key).copied()
    }

    async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.get(key).await.unwrap()
    }
}

#[async_trait]
impl KvStore for FaultyKv {
    fn name(&self) -> &'static str {
        "faulty"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("forced kv get failure".to_string()));
        }
        if key.ends_with(":version")
            && self
                .failing_version_gets
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            return Err(CacheError::Unavailable("forced version get failure".to_string()));
        }
        if self.fail_entry_get.load(Ordering::SeqCst) && !key.ends_with(":version") {
            return Err(CacheError::Timeout {
                timeout_ms: 50,
                context: key.to_string(),
            });
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("forced kv put failure".to_string()));
        }
        if self.fail_version_put.load(Ordering::SeqCst) && key.ends_with(":version") {
            return Err(CacheError::Unavailable("forced invalidate failure".to_string()));
        }
        self.ttls.lock().unwrap().insert(key.to_string(), ttl);
        self.inner.put(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Note {
    id: u64,
    title: String,
}

#[derive(Debug, Default)]
struct NoteQuery {
    search: Option<String>,
}

/// Minimal record store that counts how often it is read
#[derive(Default)]
struct Notes {
    rows: tokio::sync::RwLock<BTreeMap<u64, Note>>,
    next_id: AtomicUsize,
    reads: AtomicUsize,
    lists: AtomicUsize,
}

#[async_trait]
impl RecordStore for Notes {
    type Id = u64;
    type Record = Note;
    type Fields = String;
    type Query = NoteQuery;
    type Page = Vec<Note>;

    async fn create(&self, title: String) -> Outcome<Note> {
        if title.is_empty() {
            return Outcome::validation("title is required");
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        let note = Note { id, title };
        self.rows.write().await.insert(id, note.clone());
        Outcome::Success(note)
    }

    async fn read(&self, id: &u64) -> Outcome<Note> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.rows.read().await.get(id) {
            Some(note) => Outcome::Success(note.clone()),
            None => Outcome::not_found("Not Found"),
        }
    }

    async fn update(&self, id: &u64, title: String) -> Outcome<Note> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(id) {
            Some(note) => {
                note.title = title;
                Outcome::Success(note.clone())
            }
            None => Outcome::not_found("Not Found"),
        }
    }

    async fn delete(&self, id: &u64) -> Outcome<Note> {
        match self.rows.write().await.remove(id) {
            Some(note) => Outcome::Success(note),
            None => Outcome::not_found("Not Found"),
        }
    }

    async fn list(&self, query: &NoteQuery) -> Outcome<Vec<Note>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.read().await;
        let notes = rows
            .values()
            .filter(|n| match &query.search {
                Some(s) => n.title.contains(s.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        Outcome::Success(notes)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn setup(config: CacheConfig) -> (CachedRecords<Notes>, FaultyKv) {
    init_tracing();
    let kv = FaultyKv::new();
    let records = CachedRecords::new(Arc::new(Notes::default()), Arc::new(kv.clone()), config);
    (records, kv)
}

fn ns_config() -> CacheConfig {
    CacheConfig::builder().namespace("ns").build()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_version_lifecycle_scenario() {
    let (records, kv) = setup(ns_config());
    assert!(kv.raw("ns:version").await.is_none());

    // First list creates T1 and caches under ns:T1:list:/tasks
    let first = records.list("http://local.test/tasks", &NoteQuery::default()).await;
    assert_eq!(first.source, CacheSource::Miss);

    let t1 = String::from_utf8(kv.raw("ns:version").await.unwrap()).unwrap();
    let key1 = format!("ns:{}:list:/tasks", t1);
    assert!(kv.raw(&key1).await.is_some());

    // Second identical list is served from cache
    let second = records.list("http://local.test/tasks", &NoteQuery::default()).await;
    assert_eq!(second.source, CacheSource::Hit);
    assert_eq!(first.outcome, second.outcome);
    assert_eq!(records.records().lists.load(Ordering::SeqCst), 1);

    // Create replaces the tag
    records.create("first note".to_string()).await;
    let t2 = String::from_utf8(kv.raw("ns:version").await.unwrap()).unwrap();
    assert_ne!(t1, t2);

    // Third list misses under the new key and repopulates
    let third = records.list("http://local.test/tasks", &NoteQuery::default()).await;
    assert_eq!(third.source, CacheSource::Miss);
    assert_eq!(records.records().lists.load(Ordering::SeqCst), 2);
    assert!(kv.raw(&format!("ns:{}:list:/tasks", t2)).await.is_some());

    let notes = third.outcome.into_result().unwrap();
    assert_eq!(notes.len(), 1);
}

#[tokio::test]
async fn test_cached_payload_is_byte_identical() {
    let (records, kv) = setup(ns_config());
    records.create("a".to_string()).await;

    let first = records.list("/tasks", &NoteQuery::default()).await;
    let version = records.version_tag().current().await.unwrap();
    let key = records.keys().list(&version, "/tasks").unwrap();
    let stored = kv.raw(&key).await.unwrap();

    for _ in 0..3 {
        let again = records.list("/tasks", &NoteQuery::default()).await;
        assert!(again.is_hit());
        let bytes = serde_json::to_vec(again.outcome.as_success().unwrap()).unwrap();
        assert_eq!(bytes, stored);
    }
    assert_eq!(first.outcome.as_success().unwrap().len(), 1);
    assert_eq!(records.records().lists.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_permuted_query_shares_entry() {
    let (records, _kv) = setup(ns_config());
    let query = NoteQuery::default();

    let a = records
        .list("http://local.test/tasks?page=1&search=x&page=2", &query)
        .await;
    let b = records
        .list("http://local.test/tasks?search=x&page=2&page=1", &query)
        .await;

    assert_eq!(a.source, CacheSource::Miss);
    assert_eq!(b.source, CacheSource::Hit);
    assert_eq!(records.records().lists.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_read_is_cached_per_id() {
    let (records, kv) = setup(ns_config());
    let note = records.create("cached read".to_string()).await.into_result().unwrap();

    let first = records.read(&note.id).await;
    let second = records.read(&note.id).await;

    assert_eq!(first.source, CacheSource::Miss);
    assert_eq!(second.source, CacheSource::Hit);
    assert_eq!(second.outcome, Outcome::Success(note.clone()));
    assert_eq!(records.records().reads.load(Ordering::SeqCst), 1);

    let version = records.version_tag().current().await.unwrap();
    assert!(kv.raw(&format!("ns:{}:read:{}", version, note.id)).await.is_some());
}

#[tokio::test]
async fn test_mutation_makes_old_entries_unreachable() {
    let (records, _kv) = setup(ns_config());
    let note = records.create("before".to_string()).await.into_result().unwrap();

    records.read(&note.id).await;
    assert!(records.read(&note.id).await.is_hit());

    records.update(&note.id, "after".to_string()).await;

    let fresh = records.read(&note.id).await;
    assert_eq!(fresh.source, CacheSource::Miss);
    assert_eq!(fresh.outcome.into_result().unwrap().title, "after");
}

#[tokio::test]
async fn test_delete_invalidates_list() {
    let (records, _kv) = setup(ns_config());
    let note = records.create("doomed".to_string()).await.into_result().unwrap();

    let before = records.list("/tasks", &NoteQuery::default()).await;
    assert_eq!(before.outcome.as_success().unwrap().len(), 1);

    assert!(records.delete(&note.id).await.is_success());

    let after = records.list("/tasks", &NoteQuery::default()).await;
    assert_eq!(after.source, CacheSource::Miss);
    assert!(after.outcome.as_success().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_mutation_does_not_invalidate() {
    let (records, _kv) = setup(ns_config());
    records.list("/tasks", &NoteQuery::default()).await;
    let version = records.version_tag().current().await.unwrap();

    assert!(!records.create(String::new()).await.is_success());
    assert!(!records.update(&404, "x".to_string()).await.is_success());
    assert!(!records.delete(&404).await.is_success());

    assert_eq!(records.version_tag().current().await.unwrap(), version);
    assert!(records.list("/tasks", &NoteQuery::default()).await.is_hit());
}

#[tokio::test]
async fn test_not_found_is_never_cached() {
    let (records, kv) = setup(ns_config());

    let first = records.read(&999).await;
    let second = records.read(&999).await;

    assert!(matches!(first.outcome, Outcome::Failure(_)));
    assert_eq!(second.source, CacheSource::Miss);
    assert_eq!(records.records().reads.load(Ordering::SeqCst), 2);

    let version = records.version_tag().current().await.unwrap();
    assert!(kv.raw(&format!("ns:{}:read:999", version)).await.is_none());
}

#[tokio::test]
async fn test_fail_open_when_kv_get_faults() {
    let (records, kv) = setup(ns_config());
    records.create("still served".to_string()).await;
    kv.fail_get.store(true, Ordering::SeqCst);

    let result = records.list("/tasks", &NoteQuery::default()).await;

    assert_eq!(result.source, CacheSource::Bypass);
    let notes = result.outcome.into_result().unwrap();
    assert_eq!(notes[0].title, "still served");
}

#[tokio::test]
async fn test_fail_open_when_entry_get_times_out() {
    let (records, kv) = setup(ns_config());
    records.list("/tasks", &NoteQuery::default()).await;
    kv.fail_entry_get.store(true, Ordering::SeqCst);

    let result = records.list("/tasks", &NoteQuery::default()).await;

    assert_eq!(result.source, CacheSource::Miss);
    assert!(result.outcome.is_success());
    assert_eq!(records.records().lists.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_transient_version_fault_still_populates() {
    let (records, kv) = setup(ns_config());
    let version = records.version_tag().current().await.unwrap();
    kv.failing_version_gets.store(1, Ordering::SeqCst);

    let first = records.list("/tasks", &NoteQuery::default()).await;
    assert_eq!(first.source, CacheSource::Bypass);
    assert!(first.outcome.is_success());

    let key = records.keys().list(&version, "/tasks").unwrap();
    assert!(kv.raw(&key).await.is_some());

    let second = records.list("/tasks", &NoteQuery::default()).await;
    assert_eq!(second.source, CacheSource::Hit);
    assert_eq!(records.records().lists.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_persistent_version_fault_stores_nothing() {
    let (records, kv) = setup(ns_config());
    let version = records.version_tag().current().await.unwrap();
    kv.failing_version_gets.store(2, Ordering::SeqCst);

    let first = records.list("/tasks", &NoteQuery::default()).await;
    assert_eq!(first.source, CacheSource::Bypass);

    let key = records.keys().list(&version, "/tasks").unwrap();
    assert!(kv.raw(&key).await.is_none());
}

#[tokio::test]
async fn test_fail_open_when_kv_put_faults() {
    let (records, kv) = setup(ns_config());
    kv.fail_put.store(true, Ordering::SeqCst);

    let first = records.list("/tasks", &NoteQuery::default()).await;
    let second = records.list("/tasks", &NoteQuery::default()).await;

    assert!(first.outcome.is_success());
    assert!(!second.is_hit());
    assert_eq!(records.records().lists.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fail_open_when_only_entry_writes_fail() {
    let (records, kv) = setup(ns_config());
    // Establish the version tag first, then break entry writes only.
    records.version_tag().current().await.unwrap();
    kv.fail_put.store(true, Ordering::SeqCst);

    let first = records.list("/tasks", &NoteQuery::default()).await;
    let second = records.list("/tasks", &NoteQuery::default()).await;

    assert_eq!(first.source, CacheSource::Miss);
    assert_eq!(second.source, CacheSource::Miss);
}

#[tokio::test]
async fn test_mutation_succeeds_when_invalidation_fails() {
    let (records, kv) = setup(ns_config());
    let version = records.version_tag().current().await.unwrap();
    kv.fail_version_put.store(true, Ordering::SeqCst);

    let created = records.create("kv failure create".to_string()).await;
    assert!(created.is_success());

    let note = created.into_result().unwrap();
    assert!(records.update(&note.id, "updated".to_string()).await.is_success());
    assert!(records.delete(&note.id).await.is_success());

    assert_eq!(records.version_tag().current().await.unwrap(), version);
}

#[tokio::test]
async fn test_entries_carry_configured_ttl() {
    let config = CacheConfig::builder().namespace("ns").ttl_seconds(300).build();
    let (records, kv) = setup(config);

    records.list("/tasks", &NoteQuery::default()).await;
    let version = records.version_tag().current().await.unwrap();

    assert_eq!(kv.ttl_of("ns:version"), Some(None));
    assert_eq!(
        kv.ttl_of(&format!("ns:{}:list:/tasks", version)),
        Some(Some(Duration::from_secs(300)))
    );
}

#[tokio::test]
async fn test_configured_ttl_is_floored() {
    let config = CacheConfig::builder().namespace("ns").ttl_seconds(1).build();
    let (records, kv) = setup(config);

    records.list("/tasks", &NoteQuery::default()).await;
    let version = records.version_tag().current().await.unwrap();

    assert_eq!(
        kv.ttl_of(&format!("ns:{}:list:/tasks", version)),
        Some(Some(Duration::from_secs(60)))
    );
}

#[tokio::test]
async fn test_concurrent_first_readers_converge() {
    let kv = FaultyKv::new();
    let records = Arc::new(CachedRecords::new(
        Arc::new(Notes::default()),
        Arc::new(kv.clone()),
        ns_config(),
    ));

    let mut handles = vec![];
    for _ in 0..10 {
        let records = Arc::clone(&records);
        handles.push(tokio::spawn(async move {
            records.list("/tasks", &NoteQuery::default()).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().outcome.is_success());
    }

    // Whichever token won, every reader now agrees on it.
    let a = records.version_tag().current().await.unwrap();
    let b = records.version_tag().current().await.unwrap();
    assert_eq!(a, b);
    assert!(records.list("/tasks", &NoteQuery::default()).await.outcome.is_success());
}

#[tokio::test]
async fn test_background_writes() {
    let config = CacheConfig::builder()
        .namespace("ns")
        .write_mode(WriteMode::Background)
        .build();
    let (records, _kv) = setup(config);

    let first = records.list("/tasks", &NoteQuery::default()).await;
    assert_eq!(first.source, CacheSource::Miss);

    let mut hit = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        if records.list("/tasks", &NoteQuery::default()).await.is_hit() {
            hit = true;
            break;
        }
    }
    assert!(hit, "background write never became visible");
}

#[tokio::test]
async fn test_query_reaches_record_store() {
    let (records, _kv) = setup(ns_config());
    records.create("alpha".to_string()).await;
    records.create("beta".to_string()).await;

    let query = NoteQuery {
        search: Some("alp".to_string()),
    };
    let filtered = records.list("/tasks?search=alp", &query).await;
    assert_eq!(filtered.outcome.into_result().unwrap().len(), 1);

    let all = records.list("/tasks", &NoteQuery::default()).await;
    assert_eq!(all.outcome.into_result().unwrap().len(), 2);
}
