use crate::client::local_db::LocalDatabase;
use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};
use std::path::{Path, PathBuf};

/// Default server URL
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Client configuration wrapper.
///
/// Holds the validated [`AppConfig`] and the opaque session token supplied by
/// whatever manages authentication.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
    token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let app = AppConfig {
            server_url: std::env::var("SOCIALSYNC_API_URL").ok(),
            ..AppConfig::default()
        };
        Self { app, token: None }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        let app = builder.build()?;
        Ok(Self { app, token: None })
    }

    /// Load from a TOML file; `SOCIALSYNC_API_URL` overrides the file's server URL
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut app = AppConfig::load(path)?;
        if let Ok(url) = std::env::var("SOCIALSYNC_API_URL") {
            app.server_url = Some(url);
            app.validate()?;
        }
        Ok(Self { app, token: None })
    }

    /// Set the session token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Get the session token
    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    /// Clear the token (logout)
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url().trim_end_matches('/'), path)
    }

    pub fn server_url(&self) -> &str {
        self.app.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    /// Local database file, defaulting to the platform data directory
    pub fn database_path(&self) -> PathBuf {
        self.app
            .database_path
            .clone()
            .unwrap_or_else(LocalDatabase::default_path)
    }
}
