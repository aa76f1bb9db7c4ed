//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (POSTGRID_*)
//! 2. TOML config file (if POSTGRID_CONFIG_FILE set)
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
/// 1. Environment variables (POSTGRID_*)
/// 2. TOML config file (if POSTGRID_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding cache entries and rate windows.
    ///
    /// Set via POSTGRID_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Socket address the HTTP server binds to.
    ///
    /// Set via POSTGRID_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// JSON file the bundled content source is loaded from.
    ///
    /// Set via POSTGRID_CONTENT_PATH environment variable.
    #[serde(default = "default_content_path")]
    pub content_path: PathBuf,

    /// Lifetime of cached responses and markup in seconds. `0` disables caching.
    ///
    /// Set via POSTGRID_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of entries held by the in-process cache layer.
    ///
    /// Set via POSTGRID_MEMORY_CACHE_CAPACITY environment variable.
    #[serde(default = "default_memory_cache_capacity")]
    pub memory_cache_capacity: usize,

    /// Requests allowed per client per window on the public read path.
    ///
    /// Set via POSTGRID_RATE_LIMIT environment variable.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Rate-limit window length in seconds.
    ///
    /// Set via POSTGRID_RATE_WINDOW_SECS environment variable.
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,

    /// Interval between background purges of expired rows. `0` disables the task.
    ///
    /// Set via POSTGRID_PURGE_INTERVAL_SECS environment variable.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,

    /// Content types a grid may query. The first entry is the fallback.
    ///
    /// Set via POSTGRID_SUPPORTED_POST_TYPES environment variable (e.g. `[post,page]`).
    #[serde(default = "default_supported_post_types")]
    pub supported_post_types: Vec<String>,

    /// Taxonomies listed by the categories endpoint.
    ///
    /// Set via POSTGRID_SUPPORTED_TAXONOMIES environment variable.
    #[serde(default = "default_supported_taxonomies")]
    pub supported_taxonomies: Vec<String>,

    /// strftime-style format for `date_formatted` on records.
    ///
    /// Set via POSTGRID_DATE_FORMAT environment variable.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Bearer token granting editor capabilities.
    ///
    /// Set via POSTGRID_EDITOR_TOKEN environment variable.
    #[serde(default)]
    pub editor_token: Option<String>,

    /// Bearer token granting administrator capabilities.
    ///
    /// Set via POSTGRID_ADMIN_TOKEN environment variable.
    #[serde(default)]
    pub admin_token: Option<String>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./postgrid-cache.sqlite")
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".into()
}

fn default_content_path() -> PathBuf {
    PathBuf::from("./content.json")
}

fn default_cache_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_memory_cache_capacity() -> usize {
    512
}

fn default_rate_limit() -> u32 {
    60
}

fn default_rate_window_secs() -> u64 {
    60
}

fn default_purge_interval_secs() -> u64 {
    600
}

fn default_supported_post_types() -> Vec<String> {
    vec!["post".into()]
}

fn default_supported_taxonomies() -> Vec<String> {
    vec!["category".into()]
}

fn default_date_format() -> String {
    "%B %-d, %Y".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bind_addr: default_bind_addr(),
            content_path: default_content_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
            memory_cache_capacity: default_memory_cache_capacity(),
            rate_limit: default_rate_limit(),
            rate_window_secs: default_rate_window_secs(),
            purge_interval_secs: default_purge_interval_secs(),
            supported_post_types: default_supported_post_types(),
            supported_taxonomies: default_supported_taxonomies(),
            date_format: default_date_format(),
            editor_token: None,
            admin_token: None,
        }
    }
}

impl AppConfig {
    /// Rate-limit window as Duration.
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_secs)
    }

    /// Background purge interval, or None when the task is disabled.
    pub fn purge_interval(&self) -> Option<Duration> {
        (self.purge_interval_secs > 0).then(|| Duration::from_secs(self.purge_interval_secs))
    }

    /// The content type used when a request names an unsupported one.
    pub fn default_post_type(&self) -> &str {
        self.supported_post_types.first().map(String::as_str).unwrap_or("post")
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `POSTGRID_`
    /// 2. TOML file from `POSTGRID_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("POSTGRID_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("POSTGRID_")
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
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./postgrid-cache.sqlite"));
        assert_eq!(config.cache_ttl_secs, 300);
        assert_eq!(config.rate_limit, 60);
        assert_eq!(config.rate_window_secs, 60);
        assert_eq!(config.supported_post_types, vec!["post".to_string()]);
        assert_eq!(config.supported_taxonomies, vec!["category".to_string()]);
        assert!(config.editor_token.is_none());
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_rate_window_duration() {
        let config = AppConfig::default();
        assert_eq!(config.rate_window(), Duration::from_secs(60));
    }

    #[test]
    fn test_purge_interval_disabled() {
        let config = AppConfig { purge_interval_secs: 0, ..Default::default() };
        assert!(config.purge_interval().is_none());
    }

    #[test]
    fn test_default_post_type_is_first_supported() {
        let config = AppConfig { supported_post_types: vec!["page".into(), "post".into()], ..Default::default() };
        assert_eq!(config.default_post_type(), "page");
    }

    #[test]
    fn test_load_env_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("POSTGRID_RATE_LIMIT", "5");
            jail.set_env("POSTGRID_CACHE_TTL_SECS", "0");
            jail.set_env("POSTGRID_EDITOR_TOKEN", "editor-secret");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.rate_limit, 5);
            assert_eq!(config.cache_ttl_secs, 0);
            assert_eq!(config.editor_token.as_deref(), Some("editor-secret"));
            Ok(())
        });
    }

    #[test]
    fn test_load_toml_file_below_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "postgrid.toml",
                r#"
                rate_limit = 10
                supported_post_types = ["post", "page"]
                "#,
            )?;
            jail.set_env("POSTGRID_CONFIG_FILE", "postgrid.toml");
            jail.set_env("POSTGRID_RATE_LIMIT", "3");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.rate_limit, 3);
            assert_eq!(config.supported_post_types, vec!["post".to_string(), "page".to_string()]);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.set_env("POSTGRID_RATE_LIMIT", "0");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
