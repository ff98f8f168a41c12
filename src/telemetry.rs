//! Telemetry metric name constants.
//!
//! Centralised metric names for amelia operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `amelia_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `category`: classification category (e.g. "greeting", "coding")
//! - `source`: cache entry provenance ("local", "remote", ...)
//! - `status`: outcome: "ok" or "error"
//! - `kind`: fallback kind: "faq" or "apology"

/// Total messages classified.
///
/// Labels: `category`.
pub const CLASSIFICATIONS_TOTAL: &str = "amelia_classifications_total";

/// Total response cache hits.
///
/// Labels: `source`.
pub const CACHE_HITS_TOTAL: &str = "amelia_cache_hits_total";

/// Total response cache misses.
pub const CACHE_MISSES_TOTAL: &str = "amelia_cache_misses_total";

/// Total entries removed from the response cache other than by `delete`.
///
/// Labels: `reason` ("capacity" | "quota" | "expired" | "manual").
pub const CACHE_EVICTIONS_TOTAL: &str = "amelia_cache_evictions_total";

/// Total failed writes to durable storage.
pub const CACHE_PERSIST_FAILURES_TOTAL: &str = "amelia_cache_persist_failures_total";

/// Total chat calls issued to the remote backend.
///
/// Labels: `backend`, `status` ("ok" | "error").
pub const REMOTE_REQUESTS_TOTAL: &str = "amelia_remote_requests_total";

/// Remote chat call duration in seconds.
///
/// Labels: `backend`.
pub const REMOTE_DURATION_SECONDS: &str = "amelia_remote_duration_seconds";

/// Total retries of the backend load step (not counting the first attempt).
pub const LOAD_RETRIES_TOTAL: &str = "amelia_load_retries_total";

/// Total fallback replies produced after a remote failure.
///
/// Labels: `kind` ("faq" | "apology").
pub const FALLBACKS_TOTAL: &str = "amelia_fallbacks_total";
