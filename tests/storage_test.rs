//! Cache persistence across storage backends.

use std::sync::Arc;

use amelia::{CacheConfig, CacheSource, FileStore, KeyValueStore, ManualClock, MemoryStore, ResponseCache};
use chrono::DateTime;

fn clock() -> Arc<ManualClock> {
    let start = DateTime::parse_from_rfc3339("2026-10-15T09:00:00+07:00").unwrap();
    Arc::new(ManualClock::new(start))
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig::new();
    let clock = clock();

    {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
        let cache = ResponseCache::open(&config, Some(store), clock.clone());
        cache.set("jelaskan konsep machine learning", "Machine learning adalah ...", "remote", None);
        assert!(cache.stats().persistent);
    }

    assert!(dir.path().join("amelia_cache_v1.json").exists());

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    let cache = ResponseCache::open(&config, Some(store), clock);
    let hit = cache.get("Jelaskan konsep machine learning!").unwrap();
    assert_eq!(hit.payload, "Machine learning adalah ...");
    assert_eq!(hit.source, CacheSource::Remote);
}

#[test]
fn expired_entries_are_dropped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig::new();
    let clock = clock();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());

    let cache = ResponseCache::open(&config, Some(store.clone()), clock.clone());
    cache.set("pendek", "a", "remote", Some(std::time::Duration::from_secs(60)));
    cache.set("panjang", "b", "remote", None);
    drop(cache);

    clock.advance(chrono::Duration::minutes(5));
    let cache = ResponseCache::open(&config, Some(store), clock);
    assert_eq!(cache.len(), 1);
    assert!(cache.get("panjang").is_some());
}

#[test]
fn clear_removes_stored_copy() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    let cache = ResponseCache::open(&CacheConfig::new(), Some(store.clone()), clock());
    cache.set("a", "b", "local", None);
    assert!(store.get_item("amelia_cache_v1").unwrap().is_some());

    cache.clear();
    assert!(store.get_item("amelia_cache_v1").unwrap().is_none());
}

#[test]
fn quota_failure_evicts_and_retries() {
    let store = Arc::new(MemoryStore::with_quota(1_000));
    let config = CacheConfig::new().max_entries(100).eviction_batch(2);
    let cache = ResponseCache::open(
        &config,
        Some(store.clone() as Arc<dyn KeyValueStore>),
        clock(),
    );

    let payload = "x".repeat(100);
    for i in 0..20 {
        cache.set(&format!("pertanyaan {i}"), payload.as_str(), "remote", None);
        assert!(store.used_bytes() <= 1_000);
    }

    assert!(cache.len() < 20);
    assert!(cache.stats().persistent);
    // the newest entry always survives the quota eviction
    assert!(cache.get("pertanyaan 19").is_some());
}

#[test]
fn repeated_quota_failure_disables_persistence() {
    // smaller than the storage key itself, so even an empty map cannot be written
    let store = Arc::new(MemoryStore::with_quota(10));
    let config = CacheConfig::new().eviction_batch(1);
    let cache = ResponseCache::open(
        &config,
        Some(store.clone() as Arc<dyn KeyValueStore>),
        clock(),
    );

    cache.set("a", "1", "remote", None);
    assert!(!cache.stats().persistent);

    // memory-only from here on
    cache.set("b", "2", "remote", None);
    assert_eq!(cache.get("b").unwrap().payload, "2");
    assert_eq!(store.used_bytes(), 0);
}

#[test]
fn clear_reaches_storage_after_persistence_was_disabled() {
    let store = Arc::new(MemoryStore::with_quota(400));
    let config = CacheConfig::new().eviction_batch(1);
    let clock = clock();
    let cache = ResponseCache::open(
        &config,
        Some(store.clone() as Arc<dyn KeyValueStore>),
        clock.clone(),
    );

    cache.set("a", "1", "remote", None);
    assert!(cache.stats().persistent);
    cache.set("b", "x".repeat(1_000).as_str(), "remote", None);
    assert!(!cache.stats().persistent);

    cache.clear();
    assert_eq!(cache.len(), 0);
    assert!(store.get_item("amelia_cache_v1").unwrap().is_none());
    assert!(cache.stats().persistent);

    let reopened = ResponseCache::open(&config, Some(store as Arc<dyn KeyValueStore>), clock);
    assert_eq!(reopened.len(), 0);
}

#[test]
fn file_store_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    assert!(store.set_item("../escape", "x").is_err());
    assert!(store.set_item(".hidden", "x").is_err());
    assert!(store.set_item("", "x").is_err());
    assert!(store.set_item("amelia_cache_v1", "{}").is_ok());
}
