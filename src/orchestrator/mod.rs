//! Message routing: classifier → local reply | cache → backend → fallback.
//!
//! [`Orchestrator::process_message`] is the single entry point for user
//! input and never fails. Every path ends in a [`Reply`]:
//!
//! ```text
//! classify ─┬─ local category ─▶ render locally, cache as "local"
//!           └─ remote category ─▶ cache hit? ─▶ cached reply
//!                                  └─ miss ─▶ dispatcher ─┬─ ok ─▶ cache as "remote"
//!                                                         └─ err ─▶ FAQ or apology
//! ```
//!
//! Local replies are always recomputed (time replies must be current) even
//! though they are written to the cache.

mod builder;
mod stats;

use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

pub use builder::{Amelia, AmeliaBuilder};
pub use stats::OrchestratorStats;
use stats::Counters;

use crate::cache::{CacheSource, ResponseCache};
use crate::classify::{Category, Classifier};
use crate::clock::Clock;
use crate::events::{AmeliaEvent, EventBus};
use crate::history::{ChatRecord, HistoryStore, Sender};
use crate::normalize::{cache_key, normalize_slang};
use crate::remote::Dispatcher;
use crate::respond::EMPTY_PROMPT;
use crate::voice::{DEFAULT_MIN_CONFIDENCE, Transcript};
use crate::{AmeliaError, telemetry};

/// Which fallback answered after a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackKind {
    /// A canned FAQ answer matched the message.
    Faq,
    /// Nothing matched; the fixed apology was used.
    Apology,
}

/// Where a reply came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    Local,
    /// Served from the cache; carries the entry's original source.
    Cache(CacheSource),
    Remote,
    Fallback(FallbackKind),
}

impl fmt::Display for ReplySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplySource::Local => f.write_str("local"),
            ReplySource::Cache(origin) => write!(f, "cache ({origin})"),
            ReplySource::Remote => f.write_str("remote"),
            ReplySource::Fallback(FallbackKind::Faq) => f.write_str("fallback (faq)"),
            ReplySource::Fallback(FallbackKind::Apology) => f.write_str("fallback"),
        }
    }
}

/// Answer to one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
    /// `None` only for rejected empty input.
    pub category: Option<Category>,
    pub elapsed: Duration,
    /// Whether `text` came from the cache.
    pub cached: bool,
    /// `false` for the apology fallback and rejected input.
    pub success: bool,
    /// Backend error behind a fallback reply.
    pub error: Option<String>,
}

/// Runtime-adjustable behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Consult the cache before calling the backend. Default: true.
    pub use_cache: bool,
    /// TTL for entries written by the orchestrator. Default: 24 hours.
    pub cache_ttl: Duration,
    /// Minimum transcript confidence. Default: 0.5.
    pub min_voice_confidence: f32,
    /// Conversation id used for history records. History is written only
    /// when this and a history store are both set.
    pub conversation_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            min_voice_confidence: DEFAULT_MIN_CONFIDENCE,
            conversation_id: None,
        }
    }
}

/// Composes classifier, cache and dispatcher. Build with [`Amelia::builder`].
pub struct Orchestrator {
    classifier: Classifier,
    cache: Arc<ResponseCache>,
    dispatcher: Arc<Dispatcher>,
    history: Option<Arc<dyn HistoryStore>>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    settings: RwLock<Settings>,
    counters: Counters,
    started: Mutex<Instant>,
}

impl Orchestrator {
    /// Sweep expired cache entries. Returns how many were removed.
    pub fn init(&self) -> usize {
        let removed = self.cache.clean_expired();
        info!(
            removed,
            entries = self.cache.len(),
            "orchestrator ready"
        );
        removed
    }

    /// Answer one message. Never fails.
    pub async fn process_message(&self, text: &str) -> Reply {
        let started = Instant::now();
        if text.trim().is_empty() {
            return Reply {
                text: EMPTY_PROMPT.to_string(),
                source: ReplySource::Local,
                category: None,
                elapsed: started.elapsed(),
                cached: false,
                success: false,
                error: None,
            };
        }

        Counters::bump(&self.counters.total);
        let settings = self.settings();
        let classification = self.classifier.classify(text);
        self.events.emit(AmeliaEvent::Classified {
            category: classification.category,
            needs_remote: classification.needs_remote,
        });
        debug!(
            category = %classification.category,
            needs_remote = classification.needs_remote,
            "routing message"
        );

        let reply = if let Some(local) = self.classifier.responder().render(&classification) {
            Counters::bump(&self.counters.local);
            self.cache
                .set(text, local.as_str(), CacheSource::Local, Some(settings.cache_ttl));
            Reply {
                text: local,
                source: ReplySource::Local,
                category: Some(classification.category),
                elapsed: started.elapsed(),
                cached: false,
                success: true,
                error: None,
            }
        } else if let Some(hit) = settings
            .use_cache
            .then(|| self.cache.get(text))
            .flatten()
        {
            Counters::bump(&self.counters.cache_hits);
            self.events.emit(AmeliaEvent::CacheHit {
                key: cache_key(text),
                source: hit.source.clone(),
            });
            Reply {
                text: hit.payload,
                source: ReplySource::Cache(hit.source),
                category: Some(classification.category),
                elapsed: started.elapsed(),
                cached: true,
                success: true,
                error: None,
            }
        } else {
            match self.dispatcher.chat(text).await {
                Ok(answer) => {
                    Counters::bump(&self.counters.remote);
                    self.cache
                        .set(text, answer.as_str(), CacheSource::Remote, Some(settings.cache_ttl));
                    Reply {
                        text: answer,
                        source: ReplySource::Remote,
                        category: Some(classification.category),
                        elapsed: started.elapsed(),
                        cached: false,
                        success: true,
                        error: None,
                    }
                }
                Err(e) => self.fallback(text, classification.category, &e, started),
            }
        };

        self.record_history(&settings, text, &reply.text).await;
        reply
    }

    /// Process a speech transcript.
    ///
    /// Interim, low-confidence or blank transcripts are ignored (`None`).
    pub async fn handle_transcript(&self, transcript: &Transcript) -> Option<Reply> {
        let min_confidence = self.settings().min_voice_confidence;
        if !transcript.is_actionable(min_confidence) {
            debug!(
                is_final = transcript.is_final,
                confidence = transcript.confidence,
                "ignoring transcript"
            );
            return None;
        }
        Some(self.process_message(&transcript.text).await)
    }

    pub fn stats(&self) -> OrchestratorStats {
        OrchestratorStats::from_counters(
            &self.counters,
            self.started
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .elapsed(),
            self.dispatcher.state(),
            self.dispatcher.average_latency(),
            self.cache.stats(),
        )
    }

    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Modify settings in place.
    ///
    /// ```rust,ignore
    /// amelia.update_settings(|s| s.use_cache = false);
    /// ```
    pub fn update_settings(&self, update: impl FnOnce(&mut Settings)) {
        let mut settings = self.settings.write().unwrap_or_else(|e| e.into_inner());
        update(&mut settings);
        info!(
            use_cache = settings.use_cache,
            cache_ttl_secs = settings.cache_ttl.as_secs(),
            "settings updated"
        );
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Zero the message counters and restart the uptime clock.
    pub fn reset_stats(&self) {
        self.counters.reset();
        *self.started.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
        info!("stats reset");
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn fallback(
        &self,
        text: &str,
        category: Category,
        error: &AmeliaError,
        started: Instant,
    ) -> Reply {
        Counters::bump(&self.counters.fallbacks);

        let cleaned = text.trim().to_lowercase();
        let faq = self.classifier.faq();
        let answer = faq
            .lookup(&cleaned)
            .or_else(|| faq.lookup(&normalize_slang(text)));

        let kind = if answer.is_some() {
            FallbackKind::Faq
        } else {
            FallbackKind::Apology
        };
        metrics::counter!(telemetry::FALLBACKS_TOTAL, "kind" => match kind {
            FallbackKind::Faq => "faq",
            FallbackKind::Apology => "apology",
        })
        .increment(1);
        warn!(error = %error, fallback = ?kind, "backend failed, using fallback");
        self.events.emit(AmeliaEvent::Fallback {
            kind,
            error: error.to_string(),
        });

        Reply {
            text: answer
                .unwrap_or(self.classifier.responder().apology())
                .to_string(),
            source: ReplySource::Fallback(kind),
            category: Some(category),
            elapsed: started.elapsed(),
            cached: false,
            success: kind == FallbackKind::Faq,
            error: Some(error.to_string()),
        }
    }

    async fn record_history(&self, settings: &Settings, message: &str, reply: &str) {
        let (Some(history), Some(conversation)) = (&self.history, &settings.conversation_id)
        else {
            return;
        };
        let now = self.clock.now().with_timezone(&Utc);
        let records = [
            ChatRecord::new(conversation.as_str(), Sender::User, message, now),
            ChatRecord::new(conversation.as_str(), Sender::Assistant, reply, now),
        ];
        for record in records {
            if let Err(e) = history.append(record).await {
                warn!(error = %e, conversation = %conversation, "failed to record history");
                return;
            }
        }
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("dispatcher", &self.dispatcher)
            .field("settings", &self.settings())
            .finish_non_exhaustive()
    }
}
