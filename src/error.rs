//! Amelia error types

use std::time::Duration;

/// Amelia error types
#[derive(Debug, thiserror::Error)]
pub enum AmeliaError {
    // Backend/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("chat backend did not load within {0:?}")]
    LoadTimeout(Duration),

    /// The lazy backend load exhausted its attempts and settled in `Error`.
    #[error("chat backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("empty reply from chat backend")]
    EmptyResponse,

    // Storage errors
    #[error("storage error: {0}")]
    Storage(String),

    /// Durable storage refused a write because it is full.
    #[error("storage quota exceeded ({needed} bytes needed, {quota} allowed)")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("history error: {0}")]
    History(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AmeliaError {
    /// Whether this error is worth retrying during the backend load step.
    ///
    /// Timeouts, transport failures, 429 and 5xx responses are transient.
    /// Configuration problems and malformed data are not.
    pub fn is_transient(&self) -> bool {
        match self {
            AmeliaError::Http(_)
            | AmeliaError::LoadTimeout(_)
            | AmeliaError::BackendUnavailable(_)
            | AmeliaError::EmptyResponse => true,
            AmeliaError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether this is a storage quota failure (triggers evict-and-retry).
    pub fn is_quota(&self) -> bool {
        matches!(self, AmeliaError::QuotaExceeded { .. })
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for AmeliaError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AmeliaError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => AmeliaError::Http(err.to_string()),
        }
    }
}

impl From<std::io::Error> for AmeliaError {
    fn from(err: std::io::Error) -> Self {
        AmeliaError::Storage(err.to_string())
    }
}

/// Result type alias for Amelia operations
pub type Result<T> = std::result::Result<T, AmeliaError>;
