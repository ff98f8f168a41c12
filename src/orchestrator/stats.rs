//! Message counters and the stats snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::cache::CacheStats;
use crate::remote::BackendState;

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub total: AtomicU64,
    pub local: AtomicU64,
    pub remote: AtomicU64,
    pub cache_hits: AtomicU64,
    pub fallbacks: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        for counter in [
            &self.total,
            &self.local,
            &self.remote,
            &self.cache_hits,
            &self.fallbacks,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Snapshot returned by [`Orchestrator::stats`](super::Orchestrator::stats).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestratorStats {
    /// Non-empty messages processed.
    pub total_messages: u64,
    pub local_replies: u64,
    /// Successful backend replies.
    pub remote_replies: u64,
    /// Remote-bound messages answered from the cache.
    pub cache_hits: u64,
    pub fallbacks: u64,
    /// `cache_hits / total_messages`.
    pub cache_hit_rate: f64,
    /// `remote_replies / total_messages`.
    pub remote_share: f64,
    /// Backend calls avoided (`local_replies + cache_hits`).
    pub calls_saved: u64,
    pub uptime: Duration,
    pub backend_state: BackendState,
    pub average_remote_latency: Option<Duration>,
    pub cache: CacheStats,
}

impl OrchestratorStats {
    pub(crate) fn from_counters(
        counters: &Counters,
        uptime: Duration,
        backend_state: BackendState,
        average_remote_latency: Option<Duration>,
        cache: CacheStats,
    ) -> Self {
        let total = counters.total.load(Ordering::Relaxed);
        let local = counters.local.load(Ordering::Relaxed);
        let remote = counters.remote.load(Ordering::Relaxed);
        let cache_hits = counters.cache_hits.load(Ordering::Relaxed);
        let ratio = |n: u64| if total == 0 { 0.0 } else { n as f64 / total as f64 };

        Self {
            total_messages: total,
            local_replies: local,
            remote_replies: remote,
            cache_hits,
            fallbacks: counters.fallbacks.load(Ordering::Relaxed),
            cache_hit_rate: ratio(cache_hits),
            remote_share: ratio(remote),
            calls_saved: local + cache_hits,
            uptime,
            backend_state,
            average_remote_latency,
            cache,
        }
    }
}

impl std::fmt::Display for OrchestratorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "messages: {} (local {}, remote {}, cache hits {}, fallbacks {})",
            self.total_messages,
            self.local_replies,
            self.remote_replies,
            self.cache_hits,
            self.fallbacks
        )?;
        writeln!(
            f,
            "cache hit rate: {:.1}%, remote share: {:.1}%, calls saved: {}",
            self.cache_hit_rate * 100.0,
            self.remote_share * 100.0,
            self.calls_saved
        )?;
        writeln!(
            f,
            "cache: {}/{} entries, {} lookups, {:.1}% hit rate, {} bytes{}",
            self.cache.size,
            self.cache.max_size,
            self.cache.total,
            self.cache.hit_rate * 100.0,
            self.cache.storage_bytes,
            if self.cache.persistent { "" } else { " (memory only)" }
        )?;
        write!(
            f,
            "backend: {}, uptime: {}s",
            self.backend_state,
            self.uptime.as_secs()
        )?;
        if let Some(latency) = self.average_remote_latency {
            write!(f, ", avg latency: {}ms", latency.as_millis())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_are_zero_without_messages() {
        let stats = OrchestratorStats::from_counters(
            &Counters::default(),
            Duration::ZERO,
            BackendState::Idle,
            None,
            CacheStats::default(),
        );
        assert_eq!(stats.cache_hit_rate, 0.0);
        assert_eq!(stats.remote_share, 0.0);
        assert_eq!(stats.calls_saved, 0);
    }

    #[test]
    fn calls_saved_counts_local_and_cache() {
        let counters = Counters::default();
        for _ in 0..4 {
            Counters::bump(&counters.total);
        }
        Counters::bump(&counters.local);
        Counters::bump(&counters.cache_hits);
        Counters::bump(&counters.remote);
        let stats = OrchestratorStats::from_counters(
            &counters,
            Duration::from_secs(3),
            BackendState::Ready,
            None,
            CacheStats::default(),
        );
        assert_eq!(stats.calls_saved, 2);
        assert_eq!(stats.cache_hit_rate, 0.25);
        assert_eq!(stats.remote_share, 0.25);

        counters.reset();
        assert_eq!(counters.total.load(Ordering::Relaxed), 0);
    }
}
