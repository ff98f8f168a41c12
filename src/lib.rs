//! Amelia - message routing core for a hosted chat assistant
//!
//! Amelia answers what it can locally and only sends the rest to a remote
//! chat service. A rule-based [`Classifier`] sorts each message into one of
//! twelve [`Category`] values. Greetings, arithmetic, time questions, FAQ
//! entries and questions about the assistant's creator are answered on the
//! spot. Everything else is looked up in a [`ResponseCache`] and, on a miss,
//! sent through a FIFO single-flight [`Dispatcher`] to the backend.
//!
//! # Example
//!
//! ```rust,no_run
//! use amelia::{Amelia, CacheConfig};
//!
//! #[tokio::main]
//! async fn main() -> amelia::Result<()> {
//!     let amelia = Amelia::builder()
//!         .http("https://chat.example.com/api/chat")
//!         .cache_config(CacheConfig::new().max_entries(200))
//!         .build()?;
//!     amelia.init();
//!
//!     let reply = amelia.process_message("Halo, apa kabar?").await;
//!     println!("[{}] {}", reply.source, reply.text);
//!
//!     let reply = amelia.process_message("jelaskan konsep machine learning").await;
//!     println!("[{}] {}", reply.source, reply.text);
//!     Ok(())
//! }
//! ```
//!
//! # Failure handling
//!
//! [`Orchestrator::process_message`] never fails. Storage errors degrade the
//! cache to memory-only, backend errors fall back to an FAQ answer or a fixed
//! apology, and arithmetic that does not evaluate simply fails the math rule.

pub mod cache;
pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod normalize;
pub mod orchestrator;
pub mod remote;
pub mod respond;
pub mod telemetry;
pub mod version;
pub mod voice;

// Re-export main types at crate root
pub use error::{AmeliaError, Result};
pub use orchestrator::{
    Amelia, AmeliaBuilder, FallbackKind, Orchestrator, OrchestratorStats, Reply, ReplySource,
    Settings,
};

pub use cache::{
    CacheConfig, CacheEntry, CacheHit, CacheSource, CacheStats, FileStore, KeyValueStore,
    MemoryStore, ResponseCache,
};
pub use classify::{Category, Classification, Classifier, FaqTable, Language};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use events::{AmeliaEvent, EventBus};
pub use history::{ChatRecord, HistoryStore, JsonlHistory, MemoryHistory, Sender};
pub use normalize::{cache_key, normalize};
pub use remote::{
    BackendLoader, BackendState, ChatBackend, Dispatcher, ReadyLoader, RemoteLatency, RetryConfig,
};
#[cfg(feature = "http")]
pub use remote::{HttpBackend, HttpLoader};
pub use respond::LocalResponder;
pub use voice::Transcript;
