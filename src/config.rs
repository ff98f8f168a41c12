//! Configuration loading.
//!
//! Configuration is loaded from TOML with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.amelia/config.toml` (user)
//! 3. `/etc/amelia/config.toml` (system)
//!
//! With no file at all, defaults are used. Every section and key is
//! optional.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::{CacheConfig, FileStore};
use crate::history::JsonlHistory;
use crate::orchestrator::AmeliaBuilder;
use crate::remote::RetryConfig;
use crate::voice::DEFAULT_MIN_CONFIDENCE;
use crate::{AmeliaError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub voice: VoiceSection,
    #[serde(default)]
    pub history: HistorySection,
}

/// `[cache]`
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Consult the cache before calling the backend (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Entry time-to-live in seconds (default: 86400).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum entries (default: 500).
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Entries evicted at once when full (default: 50).
    #[serde(default = "default_eviction_batch")]
    pub eviction_batch: usize,
    /// Persist the cache to disk (default: true).
    #[serde(default = "default_true")]
    pub persist: bool,
    /// Directory for the persisted cache (default: `~/.amelia/storage`).
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            eviction_batch: default_eviction_batch(),
            persist: default_true(),
            storage_dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_max_entries() -> usize {
    500
}

fn default_eviction_batch() -> usize {
    50
}

/// `[remote]`
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSection {
    /// Chat endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Probed with `GET` while loading the backend.
    #[serde(default)]
    pub health_url: Option<String>,
    /// Bound on each load attempt in seconds (default: 30).
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,
    /// Load attempts including the first (default: 3).
    #[serde(default = "default_load_attempts")]
    pub load_attempts: u32,
    /// Delay before the first load retry in milliseconds (default: 2000).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Per-request timeout in seconds. No timeout when unset.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            health_url: None,
            load_timeout_secs: default_load_timeout_secs(),
            load_attempts: default_load_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: None,
        }
    }
}

fn default_load_timeout_secs() -> u64 {
    30
}

fn default_load_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

/// `[voice]`
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceSection {
    /// Transcripts below this confidence are ignored (default: 0.5).
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

impl Default for VoiceSection {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
        }
    }
}

fn default_min_confidence() -> f32 {
    DEFAULT_MIN_CONFIDENCE
}

/// `[history]`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistorySection {
    /// Record history even without an explicit `path` (default: false).
    #[serde(default)]
    pub enabled: bool,
    /// JSON-lines history file (default: `~/.amelia/history.jsonl`).
    /// Setting it turns history on.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Conversation id for recorded messages (default: "default").
    #[serde(default)]
    pub conversation: Option<String>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist. Without one, the first existing file of
    /// `~/.amelia/config.toml` and `/etc/amelia/config.toml` is used, or
    /// defaults if neither exists.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AmeliaError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            AmeliaError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(AmeliaError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".amelia").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/amelia/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .max_entries(self.cache.max_entries)
            .eviction_batch(self.cache.eviction_batch)
            .ttl(Duration::from_secs(self.cache.ttl_secs))
    }

    /// Where the cache is persisted, `None` for a memory-only cache.
    pub fn storage_dir(&self) -> Option<PathBuf> {
        if !self.cache.persist {
            return None;
        }
        self.cache.storage_dir.clone().or_else(FileStore::default_dir)
    }

    /// History file, `None` when history is off.
    pub fn history_path(&self) -> Option<PathBuf> {
        match &self.history.path {
            Some(path) => Some(path.clone()),
            None if self.history.enabled => JsonlHistory::default_path(),
            None => None,
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .max_attempts(self.remote.load_attempts)
            .initial_delay(Duration::from_millis(self.remote.retry_delay_ms))
    }

    /// A builder with every configured component applied.
    ///
    /// Fails if the storage directory cannot be created. The chat backend
    /// is only set when `[remote] endpoint` is present.
    pub fn builder(&self) -> Result<AmeliaBuilder> {
        let mut builder = AmeliaBuilder::new()
            .cache_config(self.cache_config())
            .use_cache(self.cache.enabled)
            .retry(self.retry_config())
            .load_timeout(Duration::from_secs(self.remote.load_timeout_secs))
            .min_voice_confidence(self.voice.min_confidence);

        if let Some(dir) = self.storage_dir() {
            builder = builder.storage(Arc::new(FileStore::open(&dir)?));
        }

        if let Some(path) = self.history_path() {
            builder = builder
                .history(Arc::new(JsonlHistory::new(path)))
                .conversation(self.history.conversation.as_deref().unwrap_or("default"));
        }

        #[cfg(feature = "http")]
        if let Some(endpoint) = &self.remote.endpoint {
            let mut loader = crate::remote::HttpLoader::new(endpoint);
            if let Some(url) = &self.remote.health_url {
                loader = loader.health_url(url);
            }
            if let Some(secs) = self.remote.request_timeout_secs {
                loader = loader.request_timeout(Duration::from_secs(secs));
            }
            builder = builder.loader(Arc::new(loader));
        }

        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 86_400);
        assert_eq!(config.cache.max_entries, 500);
        assert_eq!(config.cache.eviction_batch, 50);
        assert_eq!(config.remote.load_timeout_secs, 30);
        assert_eq!(config.remote.load_attempts, 3);
        assert_eq!(config.remote.retry_delay_ms, 2000);
        assert_eq!(config.voice.min_confidence, 0.5);
        assert!(config.remote.endpoint.is_none());
    }

    #[test]
    fn parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.cache.max_entries, 500);
    }

    #[test]
    fn parse_partial_section_keeps_defaults() {
        let toml = r#"
            [cache]
            max_entries = 100
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.max_entries, 100);
        assert_eq!(config.cache.eviction_batch, 50);
        assert!(config.cache.enabled);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [cache]
            enabled = false
            ttl_secs = 3600
            max_entries = 200
            eviction_batch = 20
            storage_dir = "/var/lib/amelia"

            [remote]
            endpoint = "https://chat.example.com/api/chat"
            health_url = "https://chat.example.com/health"
            load_timeout_secs = 10
            load_attempts = 5
            retry_delay_ms = 500
            request_timeout_secs = 60

            [voice]
            min_confidence = 0.7

            [history]
            path = "/tmp/history.jsonl"
            conversation = "cli"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.storage_dir, Some(PathBuf::from("/var/lib/amelia")));
        assert_eq!(
            config.remote.endpoint.as_deref(),
            Some("https://chat.example.com/api/chat")
        );
        assert_eq!(config.remote.request_timeout_secs, Some(60));
        assert_eq!(config.voice.min_confidence, 0.7);
        assert_eq!(config.history.conversation.as_deref(), Some("cli"));

        let cache = config.cache_config();
        assert_eq!(cache.ttl, Duration::from_secs(3600));
        assert_eq!(cache.eviction_batch, 20);

        let retry = config.retry_config();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.initial_delay, Duration::from_millis(500));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config: Config = toml::from_str("[ui]\ntheme = \"dark\"\n").unwrap();
        assert!(config.cache.enabled);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/amelia.toml"))).unwrap_err();
        assert!(matches!(err, AmeliaError::Configuration(_)));
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[voice]\nmin_confidence = 0.9\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.voice.min_confidence, 0.9);
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cache\n").unwrap();
        assert!(matches!(
            Config::load(Some(&path)),
            Err(AmeliaError::Configuration(_))
        ));
    }

    #[test]
    fn storage_dir_defaults_under_home() {
        let config = Config::default();
        assert_eq!(config.storage_dir(), FileStore::default_dir());
        if let Some(dir) = config.storage_dir() {
            assert!(dir.ends_with(".amelia/storage"));
        }

        let config: Config = toml::from_str("[cache]\nstorage_dir = \"/srv/amelia\"\n").unwrap();
        assert_eq!(config.storage_dir(), Some(PathBuf::from("/srv/amelia")));

        let config: Config =
            toml::from_str("[cache]\npersist = false\nstorage_dir = \"/srv/amelia\"\n").unwrap();
        assert_eq!(config.storage_dir(), None);
    }

    #[test]
    fn history_path_resolution() {
        assert_eq!(Config::default().history_path(), None);

        let config: Config = toml::from_str("[history]\nenabled = true\n").unwrap();
        assert_eq!(config.history_path(), JsonlHistory::default_path());
        if let Some(path) = config.history_path() {
            assert!(path.ends_with(".amelia/history.jsonl"));
        }

        let config: Config = toml::from_str("[history]\npath = \"/tmp/h.jsonl\"\n").unwrap();
        assert_eq!(config.history_path(), Some(PathBuf::from("/tmp/h.jsonl")));
    }

    #[test]
    fn builder_without_endpoint_has_no_backend() {
        let config: Config = toml::from_str("[cache]\npersist = false\n").unwrap();
        let builder = config.builder().unwrap();
        assert!(builder.build().is_err());
    }
}
