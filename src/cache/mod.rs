//! Reply caching.
//!
//! - [`response::ResponseCache`]: bounded TTL cache from normalized message
//!   to reply, with batch eviction of the oldest entries. See the
//!   [`response`] module docs for capacity and persistence rules.
//!
//! - [`storage`]: the durable [`KeyValueStore`] the cache writes through to,
//!   with an in-memory and a file-backed implementation.

pub mod response;
pub mod storage;

pub use response::{
    CacheConfig, CacheEntry, CacheHit, CacheSource, CacheStats, DEFAULT_STORAGE_KEY, EntrySummary,
    ResponseCache,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
