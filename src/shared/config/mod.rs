//! Application configuration module
//!
//! Configuration for the sync layer: backend location, local database path,
//! drain/retry tuning and cache freshness policies. Loaded from TOML with every
//! field optional; missing fields fall back to defaults.
//!
//! ```toml
//! server_url = "https://api.example.com"
//!
//! [sync]
//! dispatch_timeout_ms = 10000
//! max_attempts = 8
//! backoff = { strategy = "exponential", base_ms = 500, max_ms = 60000 }
//!
//! [cache]
//! messages_refetch_secs = 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server URL
    pub server_url: Option<String>,
    /// Location of the local SQLite database
    pub database_path: Option<PathBuf>,
    /// Queue draining and retry settings
    pub sync: SyncSettings,
    /// Remote state cache settings
    pub cache: CacheSettings,
}

/// Queue draining and retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// A dispatch that takes longer than this counts as a network failure
    pub dispatch_timeout_ms: u64,
    /// Delay policy between retry attempts
    pub backoff: BackoffSettings,
    /// Give up on an action after this many retryable failures
    pub max_attempts: Option<u32>,
    /// Give up on an action that is still failing after this many hours
    pub max_action_age_hours: Option<i64>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            dispatch_timeout_ms: 15_000,
            backoff: BackoffSettings::default(),
            max_attempts: None,
            max_action_age_hours: None,
        }
    }
}

impl SyncSettings {
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    pub fn max_action_age(&self) -> Option<chrono::Duration> {
        self.max_action_age_hours.map(chrono::Duration::hours)
    }
}

/// Retry delay settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum BackoffSettings {
    /// Same delay after every failure
    Fixed {
        /// Interval in milliseconds
        interval_ms: u64,
    },
    /// Doubling delay, capped
    Exponential {
        /// Delay after the first failure, in milliseconds
        base_ms: u64,
        /// Upper bound for the delay, in milliseconds
        max_ms: u64,
    },
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self::Exponential {
            base_ms: 1_000,
            max_ms: 300_000,
        }
    }
}

/// Freshness settings for the remote state cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Refetch interval for the conversation list
    pub conversations_refetch_secs: u64,
    /// Refetch interval for a conversation's messages
    pub messages_refetch_secs: u64,
    /// Refetch when the app returns to the foreground
    pub refetch_on_focus: bool,
    /// Refetch when a view mounts a key
    pub refetch_on_mount: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            conversations_refetch_secs: 30,
            messages_refetch_secs: 5,
            refetch_on_focus: true,
            refetch_on_mount: true,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.server_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if self.sync.dispatch_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("sync.dispatch_timeout_ms"));
        }
        if self.sync.max_attempts == Some(0) {
            return Err(ConfigError::InvalidValue("sync.max_attempts"));
        }
        match self.sync.backoff {
            BackoffSettings::Fixed { interval_ms: 0 } => {
                return Err(ConfigError::InvalidValue("sync.backoff.interval_ms"));
            }
            BackoffSettings::Exponential { base_ms, max_ms } if base_ms == 0 || max_ms < base_ms => {
                return Err(ConfigError::InvalidValue("sync.backoff"));
            }
            _ => {}
        }
        if self.cache.conversations_refetch_secs == 0 {
            return Err(ConfigError::InvalidValue("cache.conversations_refetch_secs"));
        }
        if self.cache.messages_refetch_secs == 0 {
            return Err(ConfigError::InvalidValue("cache.messages_refetch_secs"));
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = Some(url.into());
        self
    }

    /// Set the local database path
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_path = Some(path.into());
        self
    }

    /// Replace the sync settings
    pub fn sync(mut self, sync: SyncSettings) -> Self {
        self.config.sync = sync;
        self
    }

    /// Replace the cache settings
    pub fn cache(mut self, cache: CacheSettings) -> Self {
        self.config.cache = cache;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {0}")]
    InvalidValue(&'static str),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
