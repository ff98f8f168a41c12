//! Long-term chat history.
//!
//! History sits outside the classify/cache hot path. The orchestrator
//! appends both sides of each exchange when a store and a conversation id
//! are configured; failures are logged and never retried.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::{AmeliaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One stored message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub conversation_id: String,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatRecord {
    pub fn new(
        conversation_id: impl Into<String>,
        sender: Sender,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            sender,
            content: content.into(),
            timestamp,
        }
    }
}

/// Append-only message store.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, record: ChatRecord) -> Result<()>;

    /// Messages of one conversation, oldest first.
    async fn list(&self, conversation_id: &str) -> Result<Vec<ChatRecord>>;
}

/// In-process history.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    records: Mutex<Vec<ChatRecord>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn append(&self, record: ChatRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
        Ok(())
    }

    async fn list(&self, conversation_id: &str) -> Result<Vec<ChatRecord>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .iter()
            .filter(|r| r.conversation_id == conversation_id)
            .cloned()
            .collect())
    }
}

/// History in a JSON-lines file, one record per line.
///
/// Lines that fail to parse are skipped when listing.
#[derive(Debug)]
pub struct JsonlHistory {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Default location: `~/.amelia/history.jsonl`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".amelia").join("history.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for JsonlHistory {
    async fn append(&self, record: ChatRecord) -> Result<()> {
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AmeliaError::History(format!("create {parent:?}: {e}")))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AmeliaError::History(format!("open {:?}: {e}", self.path)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AmeliaError::History(format!("write {:?}: {e}", self.path)))?;
        file.flush()
            .await
            .map_err(|e| AmeliaError::History(format!("flush {:?}: {e}", self.path)))
    }

    async fn list(&self, conversation_id: &str) -> Result<Vec<ChatRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AmeliaError::History(format!("read {:?}: {e}", self.path)));
            }
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str::<ChatRecord>(line).ok())
            .filter(|r| r.conversation_id == conversation_id)
            .collect())
    }
}
