//! Builder for configuring orchestrator instances.

use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use super::stats::Counters;
use super::{Orchestrator, Settings};
use crate::cache::{CacheConfig, KeyValueStore, ResponseCache};
use crate::classify::{Classifier, FaqTable};
use crate::clock::{Clock, SystemClock};
use crate::events::EventBus;
use crate::history::HistoryStore;
use crate::remote::{
    BackendLoader, ChatBackend, DEFAULT_LOAD_TIMEOUT, Dispatcher, ReadyLoader, RetryConfig,
};
use crate::respond::LocalResponder;
use crate::{AmeliaError, Result};

/// Main entry point for creating orchestrators.
pub struct Amelia;

impl Amelia {
    pub fn builder() -> AmeliaBuilder {
        AmeliaBuilder::new()
    }
}

/// Builder for [`Orchestrator`].
///
/// A chat backend (via [`loader`](Self::loader), [`backend`](Self::backend)
/// or [`http`](Self::http)) is required; everything else has defaults.
///
/// ```rust,ignore
/// let amelia = Amelia::builder()
///     .http("https://chat.example.com/api/chat")
///     .cache_config(CacheConfig::new().max_entries(200))
///     .build()?;
/// ```
pub struct AmeliaBuilder {
    loader: Option<Arc<dyn BackendLoader>>,
    retry: RetryConfig,
    load_timeout: Duration,
    faq: FaqTable,
    clock: Arc<dyn Clock>,
    cache_config: CacheConfig,
    storage: Option<Arc<dyn KeyValueStore>>,
    history: Option<Arc<dyn HistoryStore>>,
    events: Option<EventBus>,
    settings: Settings,
}

impl AmeliaBuilder {
    pub fn new() -> Self {
        Self {
            loader: None,
            retry: RetryConfig::default(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            faq: FaqTable::default(),
            clock: Arc::new(SystemClock),
            cache_config: CacheConfig::default(),
            storage: None,
            history: None,
            events: None,
            settings: Settings::default(),
        }
    }

    /// Use a custom backend loader. Loading happens on the first remote message.
    pub fn loader(mut self, loader: Arc<dyn BackendLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Use an already constructed backend.
    pub fn backend(self, backend: Arc<dyn ChatBackend>) -> Self {
        self.loader(Arc::new(ReadyLoader::new(backend)))
    }

    /// Use the JSON-over-HTTP backend at `endpoint`.
    #[cfg(feature = "http")]
    pub fn http(self, endpoint: impl Into<String>) -> Self {
        self.loader(Arc::new(crate::remote::HttpLoader::new(endpoint)))
    }

    /// Retry policy for loading the backend.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Bound on each backend load attempt (default: 30s).
    pub fn load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Replace the FAQ table.
    pub fn faq(mut self, faq: FaqTable) -> Self {
        self.faq = faq;
        self
    }

    /// Clock for time replies, cache timestamps and history.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Cache capacity, eviction batch and default TTL.
    ///
    /// Also sets the orchestrator's cache TTL setting to `config.ttl`.
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.settings.cache_ttl = config.ttl;
        self.cache_config = config;
        self
    }

    /// Persist the cache to `storage`. Memory-only without this.
    pub fn storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Record exchanges to `store` (requires a conversation id).
    pub fn history(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    /// Conversation id for history records.
    pub fn conversation(mut self, id: impl Into<String>) -> Self {
        self.settings.conversation_id = Some(id.into());
        self
    }

    /// Share an existing event bus.
    pub fn events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Consult the cache before calling the backend (default: true).
    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.settings.use_cache = enabled;
        self
    }

    /// Minimum confidence for voice transcripts (default: 0.5).
    pub fn min_voice_confidence(mut self, confidence: f32) -> Self {
        self.settings.min_voice_confidence = confidence;
        self
    }

    /// Build the orchestrator.
    pub fn build(self) -> Result<Orchestrator> {
        let loader = self.loader.ok_or_else(|| {
            AmeliaError::Configuration("no chat backend configured".to_string())
        })?;

        let events = self.events.unwrap_or_default();
        let dispatcher = Dispatcher::new(loader)
            .retry(self.retry)
            .load_timeout(self.load_timeout)
            .events(events.clone());
        let cache = ResponseCache::open(&self.cache_config, self.storage, self.clock.clone());
        let classifier = Classifier::new(self.faq, LocalResponder::new(self.clock.clone()));

        Ok(Orchestrator {
            classifier,
            cache: Arc::new(cache),
            dispatcher: Arc::new(dispatcher),
            history: self.history,
            events,
            clock: self.clock,
            settings: RwLock::new(self.settings),
            counters: Counters::default(),
            started: Mutex::new(Instant::now()),
        })
    }
}

impl Default for AmeliaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
