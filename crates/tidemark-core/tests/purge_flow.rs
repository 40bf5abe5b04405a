//! Cache purge against the on-disk store and archive.

use serde_json::json;
use tempfile::TempDir;
use tidemark_core::archive::{BulkStoreError, MemoryArchive, SqliteArchive};
use tidemark_core::cache::LocalCache;
use tidemark_core::config::{archive_path, store_path};
use tidemark_core::keys::{
    DEFAULT_PURGE_KEYS, EVENTS_RESULTS, FORM_SETTINGS, LAST_SEARCH_PARAMS, USERNAME_CACHE,
};
use tidemark_core::record::RawEvent;
use tidemark_core::store::{FileStore, KeyValueStore, MemoryStore};

fn every_purge_key_seeded() -> MemoryStore {
    let mut store = MemoryStore::new();
    for key in DEFAULT_PURGE_KEYS {
        store.insert_raw(key, "[]");
    }
    store.insert_raw(FORM_SETTINGS, r#"{"githubToken":"abc","username":"octocat"}"#);
    store
}

#[test]
fn keeping_secret_returns_token_and_removes_every_key() {
    let mut cache = LocalCache::new(every_purge_key_seeded());
    let mut archive = MemoryArchive::new();

    let purge = cache.purge_keeping_secret(&mut archive);

    assert_eq!(purge.preserved, "abc");
    assert_eq!(purge.report.removed.len(), DEFAULT_PURGE_KEYS.len());
    assert!(purge.archive_cleared.is_ok());
    assert!(!cache.store().contains(FORM_SETTINGS));
    assert!(cache.store().is_empty());
}

#[test]
fn legacy_keys_are_purged_too() {
    let mut store = MemoryStore::new();
    store.insert_raw(LAST_SEARCH_PARAMS, "{}");
    store.insert_raw(USERNAME_CACHE, "{}");
    let mut cache = LocalCache::new(store);

    let report = cache.purge_all();

    assert_eq!(
        report.removed,
        vec![LAST_SEARCH_PARAMS.to_string(), USERNAME_CACHE.to_string()]
    );
}

#[test]
fn missing_form_settings_preserves_empty_secret() {
    let mut store = MemoryStore::new();
    store.insert_raw(EVENTS_RESULTS, "[]");
    let mut cache = LocalCache::new(store);
    let mut archive = MemoryArchive::new();

    let purge = cache.purge_keeping_secret(&mut archive);

    assert_eq!(purge.preserved, "");
    assert_eq!(purge.report.removed, vec![EVENTS_RESULTS.to_string()]);
}

#[test]
fn archive_failure_does_not_revert_key_removals() {
    let mut cache = LocalCache::new(every_purge_key_seeded());
    let mut archive = MemoryArchive::new();
    archive.inject_clear_failure(BulkStoreError::Backend("database is locked".to_string()));

    let purge = cache.purge_keeping_secret(&mut archive);

    assert!(matches!(purge.archive_cleared, Err(BulkStoreError::Backend(_))));
    assert_eq!(purge.preserved, "abc");
    assert!(cache.store().is_empty());
}

#[test]
fn purge_on_disk_clears_store_file_and_sqlite_archive() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();

    {
        let mut store = FileStore::open(store_path(root), None).expect("open store");
        store
            .set(FORM_SETTINGS, r#"{"githubToken":"on-disk"}"#)
            .expect("seed form settings");
        store.set(EVENTS_RESULTS, "[]").expect("seed events");
        store.set("unrelated", "stays").expect("seed unrelated");

        let mut archive = SqliteArchive::open(&archive_path(root)).expect("open archive");
        let event: RawEvent = serde_json::from_value(json!({
            "id": "1",
            "type": "PushEvent",
            "created_at": "2024-03-01T00:00:00Z",
        }))
        .expect("valid event");
        archive.put_events(&[event]).expect("put");

        let mut cache = LocalCache::new(store);
        let purge = cache.purge_keeping_secret(&mut archive);
        assert_eq!(purge.preserved, "on-disk");
        assert!(purge.archive_cleared.is_ok());
    }

    let store = FileStore::open(store_path(root), None).expect("reopen store");
    assert_eq!(store.keys().expect("keys"), vec!["unrelated".to_string()]);
    let archive = SqliteArchive::open(&archive_path(root)).expect("reopen archive");
    assert_eq!(archive.counts().expect("counts").events, 0);
}
