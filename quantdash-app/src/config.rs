//! Application configuration loaded from TOML.
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000/api/v1"
//! timeout_secs = 30
//! token = "..."            # optional bearer token
//!
//! [settings]
//! dir = "/home/me/.config/quantdash"   # optional
//! debounce_ms = 500
//!
//! [cache]
//! stale_secs = 30
//!
//! [monitor]
//! refresh_secs = 5
//! ```
//!
//! Every section and key is optional. `QUANTDASH_API_URL` and
//! `QUANTDASH_API_TOKEN` override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "QUANTDASH_CONFIG";
pub const API_URL_ENV: &str = "QUANTDASH_API_URL";
pub const API_TOKEN_ENV: &str = "QUANTDASH_API_TOKEN";

/// File name of the chart settings store inside the settings directory.
pub const SETTINGS_FILE: &str = "chart_settings.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            timeout_secs: 30,
            token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Directory holding the chart settings file. `None` lets the caller pick
    /// a platform default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    pub debounce_ms: u64,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            dir: None,
            debounce_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub stale_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { stale_secs: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub refresh_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { refresh_secs: 5 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub settings: SettingsConfig,
    pub cache: CacheConfig,
    pub monitor: MonitorConfig,
}

impl AppConfig {
    /// Parse a config from a TOML string. Not validated.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config from a TOML file. Not validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Resolve the effective config from the process environment.
    ///
    /// `path` wins over `$QUANTDASH_CONFIG`; with neither, defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::load`] with an injectable environment lookup.
    pub fn load_with(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let from_env = env(CONFIG_ENV).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(env);
        config.validate()?;
        Ok(config)
    }

    /// Apply `QUANTDASH_API_URL` / `QUANTDASH_API_TOKEN` on top of file values.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(url) = env(API_URL_ENV) {
            self.api.base_url = url;
        }
        if let Some(token) = env(API_TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.api.token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be > 0".into()));
        }
        if self.monitor.refresh_secs == 0 {
            return Err(ConfigError::Invalid("monitor.refresh_secs must be > 0".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.settings.debounce_ms)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.cache.stale_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.refresh_secs)
    }

    /// Path of the settings file, using `fallback_dir` when no dir is configured.
    pub fn settings_file(&self, fallback_dir: &Path) -> PathBuf {
        self.settings
            .dir
            .as_deref()
            .unwrap_or(fallback_dir)
            .join(SETTINGS_FILE)
    }
}
