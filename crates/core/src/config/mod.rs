//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (MITSU_SW_*)
//! 2. TOML config file (if MITSU_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (MITSU_SW_*)
/// 2. TOML config file (if MITSU_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache database.
    ///
    /// Set via MITSU_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin of the catalog site whose responses are cached.
    ///
    /// Responses whose final URL is not on this origin are never stored.
    /// Set via MITSU_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Name of the current cache bucket.
    ///
    /// The version suffix is the only cache invalidation mechanism: bumping
    /// it makes every previously cached entry stale at the next activation.
    /// Set via MITSU_SW_CACHE_NAME environment variable.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Application-shell paths fetched and stored at install time.
    ///
    /// Set via MITSU_SW_PRECACHE environment variable (comma-separated).
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// URL substrings that bypass the cache entirely.
    ///
    /// Requests matching any segment go straight to the network and are
    /// never stored; dynamic and authenticated content must not be served
    /// stale. Set via MITSU_SW_BYPASS_SEGMENTS (comma-separated).
    #[serde(default = "default_bypass_segments")]
    pub bypass_segments: Vec<String>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via MITSU_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via MITSU_SW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via MITSU_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Base URL of the remote anime search API.
    ///
    /// Set via MITSU_SW_JIKAN_BASE_URL environment variable.
    #[serde(default = "default_jikan_base_url")]
    pub jikan_base_url: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./mitsu-sw-cache.sqlite")
}

fn default_origin() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_cache_name() -> String {
    "mitsulist-cache-v1".into()
}

fn default_precache() -> Vec<String> {
    vec![
        "/".into(),
        "/static/css/index.css".into(),
        "/static/css/variables.css".into(),
        "/static/ico/favicon.ico".into(),
        "/static/ico/android-chrome-192x192.png".into(),
        "/static/ico/android-chrome-512x512.png".into(),
    ]
}

fn default_bypass_segments() -> Vec<String> {
    vec!["/api/".into(), "/admin/".into()]
}

fn default_user_agent() -> String {
    "mitsu-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_jikan_base_url() -> String {
    "https://api.jikan.moe/v4".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_name: default_cache_name(),
            precache: default_precache(),
            bypass_segments: default_bypass_segments(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            jikan_base_url: default_jikan_base_url(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `MITSU_SW_`
    /// 2. TOML file from `MITSU_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("MITSU_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("MITSU_SW_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./mitsu-sw-cache.sqlite"));
        assert_eq!(config.origin, "http://127.0.0.1:8000");
        assert_eq!(config.cache_name, "mitsulist-cache-v1");
        assert_eq!(config.precache.len(), 6);
        assert_eq!(config.precache[0], "/");
        assert_eq!(config.bypass_segments, vec!["/api/", "/admin/"]);
        assert_eq!(config.user_agent, "mitsu-sw/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.jikan_base_url, "https://api.jikan.moe/v4");
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }
}
