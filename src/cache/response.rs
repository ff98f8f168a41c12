//! Bounded, TTL-expiring reply cache keyed by normalized message.
//!
//! [`ResponseCache`] maps [`cache_key`](crate::normalize::cache_key) of a
//! message to the reply it last produced. Two messages that normalize to the
//! same text share an entry.
//!
//! # Capacity
//!
//! The store holds at most `max_entries`. Inserting a new key into a full
//! store first evicts the `eviction_batch` oldest entries (by creation time),
//! so after `max_entries + 1` distinct inserts the store holds
//! `max_entries - eviction_batch + 1` entries. Overwriting an existing key
//! never evicts.
//!
//! # Expiry
//!
//! An entry is logically absent once `now >= expires_at`. Expired entries
//! are removed lazily by [`ResponseCache::get`] and in bulk by
//! [`ResponseCache::clean_expired`].
//!
//! # Persistence
//!
//! With a [`KeyValueStore`] attached, every mutating call writes the whole
//! map as JSON under [`CacheConfig::storage_key`]. Write failures never reach
//! the caller. A quota failure evicts one batch and retries once; if that
//! also fails the cache stays memory-only for the rest of its lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::storage::KeyValueStore;
use crate::clock::{Clock, SystemClock};
use crate::normalize::{cache_key, string_hash};
use crate::{Result, telemetry};

/// Storage key the serialized cache is written under.
pub const DEFAULT_STORAGE_KEY: &str = "amelia_cache_v1";

/// Configuration for the response cache.
///
/// ```rust
/// # use amelia::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(200)
///     .eviction_batch(20)
///     .ttl(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries. Default: 500.
    pub max_entries: usize,
    /// Entries evicted at once when the store is full. Default: 50.
    pub eviction_batch: usize,
    /// Default time-to-live. Default: 24 hours.
    pub ttl: Duration,
    /// Key used in durable storage. Default: `amelia_cache_v1`.
    pub storage_key: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 500,
            eviction_batch: 50,
            ttl: Duration::from_secs(24 * 60 * 60),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of entries (at least 1).
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n.max(1);
        self
    }

    /// Set the eviction batch size (at least 1).
    pub fn eviction_batch(mut self, n: usize) -> Self {
        self.eviction_batch = n.max(1);
        self
    }

    /// Set the default time-to-live.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the durable storage key.
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}

/// Where a cached reply came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CacheSource {
    Local,
    Remote,
    /// Any other named origin.
    Other(String),
}

impl CacheSource {
    pub fn as_str(&self) -> &str {
        match self {
            CacheSource::Local => "local",
            CacheSource::Remote => "remote",
            CacheSource::Other(name) => name,
        }
    }
}

impl From<String> for CacheSource {
    fn from(s: String) -> Self {
        match s.as_str() {
            "local" => CacheSource::Local,
            "remote" => CacheSource::Remote,
            _ => CacheSource::Other(s),
        }
    }
}

impl From<&str> for CacheSource {
    fn from(s: &str) -> Self {
        CacheSource::from(s.to_string())
    }
}

impl From<CacheSource> for String {
    fn from(source: CacheSource) -> Self {
        source.as_str().to_string()
    }
}

impl std::fmt::Display for CacheSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: String,
    pub source: CacheSource,
    pub created_at: DateTime<Utc>,
    /// Always later than `created_at`.
    pub expires_at: DateTime<Utc>,
    /// Hash of the raw (un-normalized) message, for diagnostics.
    pub message_hash: String,
    /// Insertion sequence; breaks `created_at` ties during eviction.
    #[serde(default)]
    pub seq: u64,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of a successful [`ResponseCache::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit {
    pub payload: String,
    pub source: CacheSource,
    pub created_at: DateTime<Utc>,
    /// Time since the entry was written.
    pub age: Duration,
}

/// Counters and occupancy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// `hits + misses`.
    pub total: u64,
    /// `hits / total`, or 0 before any lookup.
    pub hit_rate: f64,
    pub size: usize,
    pub max_size: usize,
    /// Approximate serialized size of the store in bytes.
    pub storage_bytes: usize,
    /// Whether writes still reach durable storage.
    pub persistent: bool,
}

/// Debug view of one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySummary {
    pub key: String,
    pub source: CacheSource,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
    next_seq: u64,
    persistence_disabled: bool,
}

/// Reply cache with optional durable persistence.
pub struct ResponseCache {
    config: CacheConfig,
    inner: Mutex<Inner>,
    storage: Option<Arc<dyn KeyValueStore>>,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    /// Memory-only cache on the system clock.
    pub fn new(config: &CacheConfig) -> Self {
        Self::open(config, None, Arc::new(SystemClock))
    }

    /// Cache backed by `storage` (if any), loading whatever it holds.
    ///
    /// Unreadable or corrupt stored data is logged and ignored.
    pub fn open(
        config: &CacheConfig,
        storage: Option<Arc<dyn KeyValueStore>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Self {
            config: config.clone(),
            inner: Mutex::new(Inner::default()),
            storage,
            clock,
        };
        cache.load();
        cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a message. Expired entries are removed and count as misses.
    pub fn get(&self, message: &str) -> Option<CacheHit> {
        let key = cache_key(message);
        let now = self.now();
        let mut inner = self.lock();

        let expired = inner.entries.get(&key).map(|e| e.is_expired_at(now));
        match expired {
            Some(false) => {
                inner.hits += 1;
                let entry = &inner.entries[&key];
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "source" => entry.source.as_str().to_string())
                    .increment(1);
                debug!(key = %key, source = %entry.source, "cache hit");
                Some(CacheHit {
                    payload: entry.payload.clone(),
                    source: entry.source.clone(),
                    created_at: entry.created_at,
                    age: (now - entry.created_at).to_std().unwrap_or_default(),
                })
            }
            Some(true) => {
                inner.entries.remove(&key);
                inner.misses += 1;
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                debug!(key = %key, "cache miss (expired)");
                None
            }
            None => {
                inner.misses += 1;
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                debug!(key = %key, "cache miss");
                None
            }
        }
    }

    /// Store a reply, overwriting any entry for the same normalized message.
    ///
    /// `ttl` defaults to [`CacheConfig::ttl`]. A zero TTL is raised to one
    /// millisecond so the entry still expires strictly after creation.
    pub fn set(
        &self,
        message: &str,
        payload: impl Into<String>,
        source: impl Into<CacheSource>,
        ttl: Option<Duration>,
    ) -> CacheEntry {
        let key = cache_key(message);
        let now = self.now();
        let ttl = TimeDelta::from_std(ttl.unwrap_or(self.config.ttl))
            .unwrap_or(TimeDelta::MAX)
            .max(TimeDelta::milliseconds(1));

        let mut inner = self.lock();
        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.config.max_entries {
            let evicted = evict_oldest_locked(&mut inner, self.config.eviction_batch);
            metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "reason" => "capacity")
                .increment(evicted as u64);
            debug!(evicted, "cache full, evicted oldest batch");
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        let entry = CacheEntry {
            payload: payload.into(),
            source: source.into(),
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            message_hash: format!("{:x}", string_hash(message)),
            seq,
        };
        debug!(key = %key, source = %entry.source, "cache set");
        inner.entries.insert(key, entry.clone());
        self.persist(&mut inner);
        entry
    }

    /// Remove the entry for a message. Returns whether one existed.
    pub fn delete(&self, message: &str) -> bool {
        let key = cache_key(message);
        let mut inner = self.lock();
        let removed = inner.entries.remove(&key).is_some();
        if removed {
            self.persist(&mut inner);
        }
        removed
    }

    /// Drop every entry, reset counters and remove the stored copy.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;

        // Removed even when persistence is disabled; a successful removal
        // frees the quota again.
        if let Some(storage) = &self.storage {
            match storage.remove_item(&self.config.storage_key) {
                Ok(()) => {
                    if inner.persistence_disabled {
                        info!("stored cache removed, persistence re-enabled");
                    }
                    inner.persistence_disabled = false;
                }
                Err(e) => warn!(error = %e, "failed to remove stored cache"),
            }
        }
        info!("cache cleared");
    }

    /// Evict the `n` oldest entries. Returns how many were removed.
    pub fn evict_oldest(&self, n: usize) -> usize {
        let mut inner = self.lock();
        let evicted = evict_oldest_locked(&mut inner, n);
        if evicted > 0 {
            metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "reason" => "manual")
                .increment(evicted as u64);
            self.persist(&mut inner);
        }
        evicted
    }

    /// Remove all expired entries. Returns how many were removed.
    pub fn clean_expired(&self) -> usize {
        let now = self.now();
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, e| !e.is_expired_at(now));
        let removed = before - inner.entries.len();
        if removed > 0 {
            metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "reason" => "expired")
                .increment(removed as u64);
            debug!(removed, "swept expired cache entries");
            self.persist(&mut inner);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let total = inner.hits + inner.misses;
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            total,
            hit_rate: if total == 0 {
                0.0
            } else {
                inner.hits as f64 / total as f64
            },
            size: inner.entries.len(),
            max_size: self.config.max_entries,
            storage_bytes: serde_json::to_string(&inner.entries).map_or(0, |s| s.len()),
            persistent: self.storage.is_some() && !inner.persistence_disabled,
        }
    }

    /// Summaries of every stored entry, oldest first.
    pub fn entries(&self) -> Vec<EntrySummary> {
        let now = self.now();
        let inner = self.lock();
        let mut list: Vec<_> = inner.entries.iter().collect();
        list.sort_by_key(|(_, e)| (e.created_at, e.seq));
        list.into_iter()
            .map(|(key, e)| EntrySummary {
                key: key.clone(),
                source: e.source.clone(),
                created_at: e.created_at,
                expires_at: e.expires_at,
                expired: e.is_expired_at(now),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self) {
        let Some(storage) = &self.storage else {
            return;
        };

        let raw = match storage.get_item(&self.config.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "failed to read stored cache");
                return;
            }
        };

        let stored: HashMap<String, CacheEntry> = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "ignoring corrupt stored cache");
                return;
            }
        };

        let now = self.now();
        let total = stored.len();
        let mut inner = self.lock();
        inner.entries = stored
            .into_iter()
            .filter(|(_, e)| !e.is_expired_at(now) && e.expires_at > e.created_at)
            .collect();
        inner.next_seq = inner.entries.values().map(|e| e.seq + 1).max().unwrap_or(0);

        let over = inner.entries.len().saturating_sub(self.config.max_entries);
        if over > 0 {
            evict_oldest_locked(&mut inner, over);
        }
        info!(loaded = inner.entries.len(), dropped = total - inner.entries.len(), "cache loaded");
    }

    fn persist(&self, inner: &mut Inner) {
        let Some(storage) = &self.storage else {
            return;
        };
        if inner.persistence_disabled {
            return;
        }

        let err = match self.write_snapshot(storage.as_ref(), inner) {
            Ok(()) => return,
            Err(e) => e,
        };
        metrics::counter!(telemetry::CACHE_PERSIST_FAILURES_TOTAL).increment(1);

        if !err.is_quota() {
            warn!(error = %err, "failed to persist cache, write dropped");
            return;
        }

        let evicted = evict_oldest_locked(inner, self.config.eviction_batch);
        metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "reason" => "quota")
            .increment(evicted as u64);
        warn!(error = %err, evicted, "storage quota exceeded, retrying after eviction");

        if let Err(e) = self.write_snapshot(storage.as_ref(), inner) {
            metrics::counter!(telemetry::CACHE_PERSIST_FAILURES_TOTAL).increment(1);
            inner.persistence_disabled = true;
            warn!(error = %e, "cache persistence disabled, continuing in memory");
        }
    }

    fn write_snapshot(&self, storage: &dyn KeyValueStore, inner: &Inner) -> Result<()> {
        let json = serde_json::to_string(&inner.entries)?;
        storage.set_item(&self.config.storage_key, &json)
    }
}

/// Remove up to `n` entries, oldest `created_at` first.
fn evict_oldest_locked(inner: &mut Inner, n: usize) -> usize {
    if n == 0 || inner.entries.is_empty() {
        return 0;
    }
    let mut order: Vec<(DateTime<Utc>, u64, String)> = inner
        .entries
        .iter()
        .map(|(k, e)| (e.created_at, e.seq, k.clone()))
        .collect();
    order.sort();

    let mut evicted = 0;
    for (_, _, key) in order.into_iter().take(n) {
        inner.entries.remove(&key);
        evicted += 1;
    }
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::storage::MemoryStore;
    use crate::clock::ManualClock;

    fn manual_clock() -> Arc<ManualClock> {
        let start = DateTime::parse_from_rfc3339("2026-10-15T09:00:00+07:00").unwrap();
        Arc::new(ManualClock::new(start))
    }

    #[test]
    fn source_round_trips_as_plain_string() {
        assert_eq!(serde_json::to_string(&CacheSource::Local).unwrap(), "\"local\"");
        let other: CacheSource = serde_json::from_str("\"faq\"").unwrap();
        assert_eq!(other, CacheSource::Other("faq".into()));
        let remote: CacheSource = serde_json::from_str("\"remote\"").unwrap();
        assert_eq!(remote, CacheSource::Remote);
    }

    #[test]
    fn config_clamps_zero_sizes() {
        let config = CacheConfig::new().max_entries(0).eviction_batch(0);
        assert_eq!(config.max_entries, 1);
        assert_eq!(config.eviction_batch, 1);
    }

    #[test]
    fn zero_ttl_still_expires_after_creation() {
        let clock = manual_clock();
        let cache = ResponseCache::open(&CacheConfig::default(), None, clock.clone());
        let entry = cache.set("halo", "hai", CacheSource::Local, Some(Duration::ZERO));
        assert!(entry.expires_at > entry.created_at);
        clock.advance(TimeDelta::milliseconds(1));
        assert!(cache.get("halo").is_none());
    }

    #[test]
    fn eviction_breaks_timestamp_ties_by_insertion_order() {
        let clock = manual_clock();
        let config = CacheConfig::new().max_entries(3).eviction_batch(1);
        let cache = ResponseCache::open(&config, None, clock);
        // same instant for every insert
        cache.set("a", "1", CacheSource::Remote, None);
        cache.set("b", "2", CacheSource::Remote, None);
        cache.set("c", "3", CacheSource::Remote, None);
        cache.set("d", "4", CacheSource::Remote, None);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn loads_entries_and_drops_expired() {
        let clock = manual_clock();
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        {
            let cache = ResponseCache::open(&CacheConfig::default(), Some(store.clone()), clock.clone());
            cache.set("short", "x", CacheSource::Remote, Some(Duration::from_secs(10)));
            cache.set("long", "y", CacheSource::Remote, Some(Duration::from_secs(1000)));
        }
        clock.advance(TimeDelta::seconds(60));
        let reopened = ResponseCache::open(&CacheConfig::default(), Some(store), clock);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("long").unwrap().payload, "y");

        // new inserts sort after loaded ones
        reopened.set("newer", "z", CacheSource::Remote, None);
        let keys: Vec<_> = reopened.entries().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec![cache_key("long"), cache_key("newer")]);
    }

    #[test]
    fn corrupt_storage_is_ignored() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set_item(DEFAULT_STORAGE_KEY, "not json").unwrap();
        let cache = ResponseCache::open(&CacheConfig::default(), Some(store), manual_clock());
        assert!(cache.is_empty());
        assert!(cache.stats().persistent);
    }

    #[test]
    fn hit_reports_age() {
        let clock = manual_clock();
        let cache = ResponseCache::open(&CacheConfig::default(), None, clock.clone());
        cache.set("apa itu ai", "AI adalah...", CacheSource::Remote, None);
        clock.advance(TimeDelta::seconds(42));
        let hit = cache.get("Apa itu AI?").unwrap();
        assert_eq!(hit.age, Duration::from_secs(42));
        assert_eq!(hit.source, CacheSource::Remote);
    }
}
