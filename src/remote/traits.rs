//! Seams to the external chat service.
//!
//! The service is opaque: one operation, text in and text out. Getting a
//! usable client is a separate, possibly slow step ([`BackendLoader`]) that
//! the [`Dispatcher`](super::Dispatcher) performs lazily on first use.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;

/// A loaded chat client.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name for logging/debugging.
    fn name(&self) -> &str;

    /// Send one message and return the reply text.
    ///
    /// The backend has no structured error taxonomy; any failure may be
    /// reported as an error.
    async fn chat(&self, text: &str) -> Result<String>;
}

/// One-time initialisation of a [`ChatBackend`].
#[async_trait]
pub trait BackendLoader: Send + Sync {
    /// Produce a ready backend. Called again only if a previous load failed.
    async fn load(&self) -> Result<Arc<dyn ChatBackend>>;
}

/// Loader for a backend that is already constructed.
pub struct ReadyLoader {
    backend: Arc<dyn ChatBackend>,
}

impl ReadyLoader {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl BackendLoader for ReadyLoader {
    async fn load(&self) -> Result<Arc<dyn ChatBackend>> {
        Ok(self.backend.clone())
    }
}
