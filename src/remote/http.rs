//! JSON-over-HTTP chat backend.
//!
//! Sends `POST <endpoint>` with body `{"message": "<text>"}`. The reply is
//! read from the first string field among `reply`, `response`, `message`,
//! `text` in a JSON object body, from a bare JSON string, or else from the
//! raw body text.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::traits::{BackendLoader, ChatBackend};
use crate::{AmeliaError, Result};

const REPLY_FIELDS: [&str; 4] = ["reply", "response", "message", "text"];

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Chat backend speaking the JSON protocol above.
#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn chat(&self, text: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ChatRequest { message: text })
            .send()
            .await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        extract_reply(&body).ok_or(AmeliaError::EmptyResponse)
    }
}

/// Builds an [`HttpBackend`], optionally probing a health URL first.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    endpoint: String,
    health_url: Option<String>,
    request_timeout: Option<Duration>,
}

impl HttpLoader {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            health_url: None,
            request_timeout: None,
        }
    }

    /// `GET` this URL during load; any non-2xx status fails the attempt.
    pub fn health_url(mut self, url: impl Into<String>) -> Self {
        self.health_url = Some(url.into());
        self
    }

    /// Per-request timeout on the underlying client. Unset by default.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl BackendLoader for HttpLoader {
    async fn load(&self) -> Result<Arc<dyn ChatBackend>> {
        if self.endpoint.trim().is_empty() {
            return Err(AmeliaError::Configuration(
                "remote endpoint is not set".to_string(),
            ));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AmeliaError::Configuration(format!("HTTP client: {e}")))?;

        if let Some(url) = &self.health_url {
            let response = http.get(url).send().await?;
            check_status(response).await?;
            debug!(url = %url, "health probe ok");
        }

        Ok(Arc::new(HttpBackend::new(http, self.endpoint.clone())))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.to_string()
    } else {
        body
    };
    Err(AmeliaError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Pull the reply text out of a response body. `None` when blank.
pub(crate) fn extract_reply(body: &str) -> Option<String> {
    let reply = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => REPLY_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(|v| v.as_str()))
            .map(str::to_string),
        Ok(serde_json::Value::String(s)) => Some(s),
        _ => Some(body.to_string()),
    }?;

    if reply.trim().is_empty() {
        None
    } else {
        Some(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_field_precedence() {
        assert_eq!(
            extract_reply(r#"{"text": "t", "reply": "r"}"#).as_deref(),
            Some("r")
        );
        assert_eq!(
            extract_reply(r#"{"message": "m", "text": "t"}"#).as_deref(),
            Some("m")
        );
    }

    #[test]
    fn bare_string_and_raw_text() {
        assert_eq!(extract_reply(r#""halo""#).as_deref(), Some("halo"));
        assert_eq!(extract_reply("plain reply").as_deref(), Some("plain reply"));
    }

    #[test]
    fn object_without_reply_field_is_empty() {
        assert!(extract_reply(r#"{"status": "ok"}"#).is_none());
        assert!(extract_reply(r#"{"reply": 42}"#).is_none());
    }

    #[test]
    fn blank_is_empty() {
        assert!(extract_reply("   ").is_none());
        assert!(extract_reply(r#"{"reply": ""}"#).is_none());
    }
}
