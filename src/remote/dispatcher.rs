//! Single-flight access to the chat backend.
//!
//! [`Dispatcher::chat`] guarantees at most one outstanding backend call.
//! Callers queue on a fair async mutex, so concurrent submissions are served
//! strictly in submission order, one at a time, and never coalesced. There
//! is no per-call timeout and no cancellation of an in-flight call.
//!
//! # Lazy loading
//!
//! The backend is loaded by the first caller to reach the head of the queue:
//!
//! ```text
//! Idle ──▶ Loading ──▶ Ready      (stays Ready for the dispatcher's lifetime)
//!              │
//!              └─────▶ Error      (after all load attempts fail)
//! ```
//!
//! Each load attempt is bounded by `load_timeout`; transient failures are
//! retried per [`RetryConfig`]. A caller that finds the dispatcher in
//! `Error` starts a fresh load cycle, so a backend that comes back later is
//! picked up without restarting.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use super::latency::RemoteLatency;
use super::retry::{RetryConfig, with_retry};
use super::traits::{BackendLoader, ChatBackend};
use crate::events::{AmeliaEvent, EventBus};
use crate::{AmeliaError, Result, telemetry};

/// Default bound on a single load attempt.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifecycle of the backend connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendState {
    Idle,
    Loading,
    Ready,
    Error,
}

impl BackendState {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendState::Idle => "idle",
            BackendState::Loading => "loading",
            BackendState::Ready => "ready",
            BackendState::Error => "error",
        }
    }
}

impl std::fmt::Display for BackendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// FIFO single-flight wrapper around a lazily loaded [`ChatBackend`].
pub struct Dispatcher {
    loader: Arc<dyn BackendLoader>,
    retry: RetryConfig,
    load_timeout: Duration,
    /// Held for the whole of each call; `Some` once loaded.
    slot: Mutex<Option<Arc<dyn ChatBackend>>>,
    state: watch::Sender<BackendState>,
    pending: AtomicUsize,
    latency: RemoteLatency,
    events: Option<EventBus>,
}

impl Dispatcher {
    pub fn new(loader: Arc<dyn BackendLoader>) -> Self {
        let (state, _) = watch::channel(BackendState::Idle);
        Self {
            loader,
            retry: RetryConfig::default(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            slot: Mutex::new(None),
            state,
            pending: AtomicUsize::new(0),
            latency: RemoteLatency::default(),
            events: None,
        }
    }

    /// Set the load retry policy.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Set the bound on each load attempt.
    pub fn load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Publish state changes on `bus`.
    pub fn events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn state(&self) -> BackendState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<BackendState> {
        self.state.subscribe()
    }

    /// Calls queued or in flight.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// EWMA of successful and failed chat call durations.
    pub fn average_latency(&self) -> Option<Duration> {
        self.latency.average()
    }

    /// Send `text` to the backend, waiting behind any earlier calls.
    ///
    /// Loads the backend first if needed. Fails with
    /// [`AmeliaError::BackendUnavailable`] when loading fails, or with the
    /// backend's own error when the call fails. Never retries the call.
    pub async fn chat(&self, text: &str) -> Result<String> {
        let _pending = PendingGuard::new(&self.pending);
        let mut slot = self.slot.lock().await;

        let backend = match slot.as_ref() {
            Some(backend) => backend.clone(),
            None => {
                let backend = self.load().await?;
                *slot = Some(backend.clone());
                backend
            }
        };

        let started = Instant::now();
        let result = backend.chat(text).await;
        let elapsed = started.elapsed();
        self.latency.record(elapsed);
        metrics::histogram!(telemetry::REMOTE_DURATION_SECONDS, "backend" => backend.name().to_owned())
            .record(elapsed.as_secs_f64());

        let result = match result {
            Ok(reply) if reply.trim().is_empty() => Err(AmeliaError::EmptyResponse),
            other => other,
        };

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::REMOTE_REQUESTS_TOTAL,
            "backend" => backend.name().to_owned(),
            "status" => status,
        )
        .increment(1);

        match &result {
            Ok(_) => debug!(
                backend = backend.name(),
                elapsed_ms = elapsed.as_millis() as u64,
                "remote reply"
            ),
            Err(e) => warn!(backend = backend.name(), error = %e, "remote call failed"),
        }
        result
    }

    async fn load(&self) -> Result<Arc<dyn ChatBackend>> {
        self.set_state(BackendState::Loading);
        info!(timeout_ms = self.load_timeout.as_millis() as u64, "loading chat backend");

        let timeout = self.load_timeout;
        let result = with_retry(&self.retry, "load", || async {
            match tokio::time::timeout(timeout, self.loader.load()).await {
                Ok(result) => result,
                Err(_) => Err(AmeliaError::LoadTimeout(timeout)),
            }
        })
        .await;

        match result {
            Ok(backend) => {
                info!(backend = backend.name(), "chat backend ready");
                self.set_state(BackendState::Ready);
                Ok(backend)
            }
            Err(e) => {
                warn!(error = %e, "chat backend failed to load");
                self.set_state(BackendState::Error);
                Err(AmeliaError::BackendUnavailable(e.to_string()))
            }
        }
    }

    fn set_state(&self, next: BackendState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "backend state");
            if let Some(bus) = &self.events {
                bus.emit(AmeliaEvent::BackendState(next));
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state())
            .field("pending", &self.pending())
            .field("latency", &self.latency)
            .finish()
    }
}

/// Counts a caller as pending until dropped.
struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
