//! # Runtime Configuration
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. built-in defaults
//! 2. `herus.toml` in the working directory, or the file given by `--config`
//! 3. environment: `HERUS_API_KEY`, `HERUS_RATE_LIMIT`, `HERUS_CORS_ORIGINS`
//! 4. command-line flags (applied by `cli`)
//!
//! ```toml
//! database = "herus.db"
//! media_dir = "media"
//! port = 3841
//!
//! [graph]
//! missing_topic = "reject"
//! ```

use herus_core::{GraphConfig, HerusError, primitives::DEFAULT_OPEN_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "herus.toml";

/// Default requests per second for the global rate limiter.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HerusConfig {
    /// redb database file.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Directory holding uploaded blobs.
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// How long to wait for another process to release the database.
    #[serde(default = "default_open_timeout_secs")]
    pub open_timeout_secs: u64,

    /// Requests per second across all clients; 0 disables limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Bearer key required on POST routes. Unset means open writes.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Comma-separated allowed origins, or "*". Unset means localhost only.
    #[serde(default)]
    pub cors_origins: Option<String>,

    #[serde(default)]
    pub graph: GraphConfig,
}

fn default_database() -> PathBuf {
    PathBuf::from("herus.db")
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("media")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3841
}

fn default_open_timeout_secs() -> u64 {
    DEFAULT_OPEN_TIMEOUT.as_secs()
}

fn default_rate_limit() -> u32 {
    DEFAULT_RATE_LIMIT
}

impl Default for HerusConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            media_dir: default_media_dir(),
            host: default_host(),
            port: default_port(),
            open_timeout_secs: default_open_timeout_secs(),
            rate_limit: default_rate_limit(),
            api_key: None,
            cors_origins: None,
            graph: GraphConfig::default(),
        }
    }
}

impl HerusConfig {
    /// Load file settings and the process environment.
    ///
    /// An explicit `path` must exist; the implicit `herus.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, HerusError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    Self::from_file(implicit)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, HerusError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HerusError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, HerusError> {
        toml::from_str(content)
            .map_err(|e| HerusError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Overlay environment values. `lookup` is `std::env::var` in
    /// production; tests pass a map.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("HERUS_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(raw) = lookup("HERUS_RATE_LIMIT") {
            match raw.trim().parse() {
                Ok(limit) => self.rate_limit = limit,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid HERUS_RATE_LIMIT"),
            }
        }
        if let Some(origins) = lookup("HERUS_CORS_ORIGINS") {
            self.cors_origins = Some(origins);
        }
        // An empty key would authenticate an empty bearer token.
        if self.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.api_key = None;
        }
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================
