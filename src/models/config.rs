//! Configuration model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TMDB configuration.
    pub tmdb: TmdbConfig,
    /// Rate limit applied to every TMDB call.
    pub rate_limit: RateLimitConfig,
    /// Retry policy for rate-limited calls.
    pub retry: RetryConfig,
    /// Catalog file.
    pub catalog_path: PathBuf,
    /// Rip filenames that are never resolved automatically.
    pub ignore_filenames: Vec<String>,
    /// Rip filename -> TMDB id, for rips the heuristics get wrong.
    pub manual_external_ids: BTreeMap<String, u64>,
}

/// TMDB configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    /// API key or Bearer token.
    pub api_key: Option<String>,
    /// Language for responses.
    pub language: String,
    /// API root.
    pub base_url: String,
}

/// Token bucket settings as stored in config.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub executions_per_window: u32,
    pub window_ms: u64,
    pub max_burst: Option<u32>,
}

/// Retry settings as stored in config.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub retry_count: u32,
    pub sleep_ms: u64,
}

/// Rate limit parameters handed to the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub executions_per_window: u32,
    pub window: Duration,
    pub max_burst: Option<u32>,
}

/// Retry parameters handed to the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub retry_count: u32,
    pub sleep_between_retries: Duration,
}

/// Source of the pipeline's tunables.
pub trait SettingsProvider {
    fn rate_limit(&self) -> RateLimitSettings;
    fn retry(&self) -> RetrySettings;
    fn manual_external_ids(&self) -> BTreeMap<String, u64>;
    fn rip_filenames_to_ignore(&self) -> Vec<String>;
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb: TmdbConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            catalog_path: dirs_config_path().join("catalog.json"),
            ignore_filenames: Vec::new(),
            manual_external_ids: BTreeMap::new(),
        }
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            language: "en-US".to_string(),
            base_url: "https://api.themoviedb.org/3".to_string(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // TMDB tolerates roughly 40 requests per 10 seconds
        Self {
            executions_per_window: 40,
            window_ms: 10_000,
            max_burst: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_count: 3,
            sleep_ms: 2_000,
        }
    }
}

impl SettingsProvider for Config {
    fn rate_limit(&self) -> RateLimitSettings {
        RateLimitSettings {
            executions_per_window: self.rate_limit.executions_per_window,
            window: Duration::from_millis(self.rate_limit.window_ms),
            max_burst: self.rate_limit.max_burst,
        }
    }

    fn retry(&self) -> RetrySettings {
        RetrySettings {
            retry_count: self.retry.retry_count,
            sleep_between_retries: Duration::from_millis(self.retry.sleep_ms),
        }
    }

    fn manual_external_ids(&self) -> BTreeMap<String, u64> {
        self.manual_external_ids.clone()
    }

    fn rip_filenames_to_ignore(&self) -> Vec<String> {
        self.ignore_filenames.clone()
    }
}

/// Get the configuration directory path.
pub fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rip_catalog")
}

/// Default location of config.toml.
pub fn default_config_file() -> PathBuf {
    dirs_config_path().join("config.toml")
}

/// Load configuration from a TOML file.
///
/// A missing file yields the defaults; a malformed one is an error. The
/// `TMDB_API_KEY` environment variable takes precedence over the file.
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        toml::from_str::<Config>(&content)?
    } else {
        tracing::debug!("No config at {}, using defaults", path.display());
        Config::default()
    };

    if let Ok(key) = std::env::var("TMDB_API_KEY") {
        if !key.trim().is_empty() {
            config.tmdb.api_key = Some(key);
        }
    }

    Ok(config)
}
