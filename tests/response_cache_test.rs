//! Response cache behaviour through the public API.

use std::sync::Arc;
use std::time::Duration;

use amelia::{
    CacheConfig, CacheSource, Clock, KeyValueStore, ManualClock, MemoryStore, ResponseCache,
};
use chrono::DateTime;

fn clock() -> Arc<ManualClock> {
    let start = DateTime::parse_from_rfc3339("2026-10-15T09:00:00+07:00").unwrap();
    Arc::new(ManualClock::new(start))
}

fn cache_with(config: CacheConfig, clock: Arc<ManualClock>) -> ResponseCache {
    ResponseCache::open(&config, None, clock)
}

#[test]
fn equivalent_messages_share_an_entry() {
    let cache = cache_with(CacheConfig::new(), clock());
    cache.set("Apa itu Rust?", "Rust adalah bahasa pemrograman.", "remote", None);

    let hit = cache.get("  apa itu rust ").unwrap();
    assert_eq!(hit.payload, "Rust adalah bahasa pemrograman.");
    assert_eq!(hit.source, CacheSource::Remote);
    assert_eq!(cache.len(), 1);
}

#[test]
fn set_is_idempotent_per_key() {
    let clock = clock();
    let cache = cache_with(CacheConfig::new(), clock.clone());
    cache.set("halo", "satu", CacheSource::Local, None);
    clock.advance(chrono::Duration::seconds(30));
    let second_write = clock.now().with_timezone(&chrono::Utc);
    cache.set("Halo!", "dua", CacheSource::Local, None);

    assert_eq!(cache.len(), 1);
    let hit = cache.get("halo").unwrap();
    assert_eq!(hit.payload, "dua");
    assert_eq!(hit.created_at, second_write);
}

#[test]
fn entries_expire_after_ttl() {
    let clock = clock();
    let cache = cache_with(CacheConfig::new(), clock.clone());
    cache.set("berita terbaru", "...", "remote", Some(Duration::from_secs(60)));

    clock.advance(chrono::Duration::seconds(59));
    assert!(cache.get("berita terbaru").is_some());

    clock.advance(chrono::Duration::seconds(1));
    assert!(cache.get("berita terbaru").is_none());
    // removed on access
    assert!(cache.is_empty());
}

#[test]
fn default_ttl_comes_from_config() {
    let clock = clock();
    let config = CacheConfig::new().ttl(Duration::from_secs(3600));
    let cache = cache_with(config, clock.clone());
    let entry = cache.set("a", "b", "remote", None);
    assert_eq!(entry.expires_at - entry.created_at, chrono::Duration::hours(1));

    clock.advance(chrono::Duration::minutes(61));
    assert_eq!(cache.clean_expired(), 1);
}

#[test]
fn full_cache_evicts_a_batch() {
    let clock = clock();
    let config = CacheConfig::new().max_entries(10).eviction_batch(3);
    let cache = cache_with(config, clock.clone());

    for i in 0..11 {
        cache.set(&format!("pesan {i}"), format!("balasan {i}"), "remote", None);
        clock.advance(chrono::Duration::seconds(1));
    }

    // max - batch + 1
    assert_eq!(cache.len(), 8);
    for i in 0..3 {
        assert!(cache.get(&format!("pesan {i}")).is_none(), "pesan {i} should be evicted");
    }
    for i in 3..11 {
        assert!(cache.get(&format!("pesan {i}")).is_some(), "pesan {i} should remain");
    }
}

#[test]
fn overwriting_at_capacity_does_not_evict() {
    let config = CacheConfig::new().max_entries(2).eviction_batch(1);
    let cache = cache_with(config, clock());
    cache.set("a", "1", "remote", None);
    cache.set("b", "2", "remote", None);
    cache.set("a", "3", "remote", None);
    assert_eq!(cache.len(), 2);
}

#[test]
fn stats_track_hits_and_misses() {
    let cache = cache_with(CacheConfig::new().max_entries(20), clock());
    cache.set("a", "1", "remote", None);
    cache.get("a");
    cache.get("a");
    cache.get("b");

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.total, 3);
    assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.size, 1);
    assert_eq!(stats.max_size, 20);
    assert!(stats.storage_bytes > 0);
    assert!(!stats.persistent);

    cache.clear();
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (0, 0, 0));
}

#[test]
fn delete_and_manual_eviction() {
    let clock = clock();
    let cache = cache_with(CacheConfig::new(), clock.clone());
    for message in ["a", "b", "c"] {
        cache.set(message, message, "local", None);
        clock.advance(chrono::Duration::seconds(1));
    }

    assert!(cache.delete("b"));
    assert!(!cache.delete("b"));
    assert_eq!(cache.evict_oldest(1), 1);

    let remaining: Vec<_> = cache.entries().into_iter().map(|e| e.key).collect();
    assert_eq!(remaining, vec![amelia::cache_key("c")]);
}

#[test]
fn custom_sources_survive_persistence() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let clock = clock();
    let config = CacheConfig::new();

    let cache = ResponseCache::open(&config, Some(store.clone()), clock.clone());
    cache.set("ringkas artikel ini", "...", "plugin:summarizer", None);
    drop(cache);

    let reopened = ResponseCache::open(&config, Some(store), clock);
    let hit = reopened.get("ringkas artikel ini").unwrap();
    assert_eq!(hit.source, CacheSource::Other("plugin:summarizer".into()));
    assert_eq!(hit.source.as_str(), "plugin:summarizer");
}
