//! Remote chat service access.
//!
//! - [`traits`]: [`ChatBackend`] (send a message) and [`BackendLoader`]
//!   (obtain a backend, lazily).
//! - [`dispatcher`]: the FIFO single-flight [`Dispatcher`] with its
//!   `Idle → Loading → Ready | Error` state machine.
//! - [`retry`]: backoff policy for the load step.
//! - [`http`]: a JSON-over-HTTP backend (feature `http`).

pub mod dispatcher;
#[cfg(feature = "http")]
pub mod http;
pub mod latency;
pub mod retry;
pub mod traits;

pub use dispatcher::{BackendState, DEFAULT_LOAD_TIMEOUT, Dispatcher};
#[cfg(feature = "http")]
pub use http::{HttpBackend, HttpLoader};
pub use latency::RemoteLatency;
pub use retry::RetryConfig;
pub use traits::{BackendLoader, ChatBackend, ReadyLoader};
