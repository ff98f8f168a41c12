//! Latency of remote chat calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default EWMA smoothing factor.
pub const DEFAULT_ALPHA: f64 = 0.2;

/// Running view of backend call durations: an exponentially weighted moving
/// average plus the most recent and slowest call.
///
/// Updated without locks from inside the dispatcher, read by stats.
pub struct RemoteLatency {
    /// `f64` bits of the EWMA in microseconds.
    ewma_bits: AtomicU64,
    last_micros: AtomicU64,
    slowest_micros: AtomicU64,
    samples: AtomicU64,
    alpha: f64,
}

impl RemoteLatency {
    /// `alpha` in `0.0..=1.0`; higher follows new samples faster.
    pub fn new(alpha: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&alpha), "alpha must be in [0.0, 1.0]");
        Self {
            ewma_bits: AtomicU64::new(0),
            last_micros: AtomicU64::new(0),
            slowest_micros: AtomicU64::new(0),
            samples: AtomicU64::new(0),
            alpha,
        }
    }

    pub fn record(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.last_micros.store(micros, Ordering::Relaxed);
        self.slowest_micros.fetch_max(micros, Ordering::Relaxed);

        let sample = micros as f64;
        let first = self.samples.fetch_add(1, Ordering::Relaxed) == 0;
        let alpha = self.alpha;
        // The closure never declines, so this cannot fail.
        let _ = self
            .ewma_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                let next = if first {
                    sample
                } else {
                    alpha * sample + (1.0 - alpha) * f64::from_bits(bits)
                };
                Some(next.to_bits())
            });
    }

    /// Smoothed call duration, `None` before the first call.
    pub fn average(&self) -> Option<Duration> {
        self.has_samples().then(|| {
            let micros = f64::from_bits(self.ewma_bits.load(Ordering::Relaxed));
            Duration::from_micros(micros as u64)
        })
    }

    pub fn last(&self) -> Option<Duration> {
        self.has_samples()
            .then(|| Duration::from_micros(self.last_micros.load(Ordering::Relaxed)))
    }

    pub fn slowest(&self) -> Option<Duration> {
        self.has_samples()
            .then(|| Duration::from_micros(self.slowest_micros.load(Ordering::Relaxed)))
    }

    pub fn observation_count(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    fn has_samples(&self) -> bool {
        self.observation_count() > 0
    }
}

impl Default for RemoteLatency {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl std::fmt::Debug for RemoteLatency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteLatency")
            .field("average", &self.average())
            .field("slowest", &self.slowest())
            .field("calls", &self.observation_count())
            .finish()
    }
}
