//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::net::SocketAddr;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

/// Upper bound for `cache_ttl_secs` (30 days).
const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Upper bound for `rate_window_secs` (1 day).
const MAX_RATE_WINDOW_SECS: u64 = 24 * 60 * 60;

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `rate_limit` is 0
    /// - `rate_window_secs` is 0 or exceeds one day
    /// - `cache_ttl_secs` exceeds 30 days
    /// - `memory_cache_capacity` is 0
    /// - `supported_post_types` is empty or holds a non-key value
    /// - `bind_addr` is not a socket address
    ///
    /// Returns `ConfigError::Missing` if `date_format` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit == 0 {
            return Err(ConfigError::Invalid { field: "rate_limit".into(), reason: "must be greater than 0".into() });
        }

        if self.rate_window_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "rate_window_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.rate_window_secs > MAX_RATE_WINDOW_SECS {
            return Err(ConfigError::Invalid {
                field: "rate_window_secs".into(),
                reason: "must not exceed one day (86400s)".into(),
            });
        }

        if self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_secs".into(),
                reason: "must not exceed 30 days".into(),
            });
        }

        if self.memory_cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "memory_cache_capacity".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.supported_post_types.is_empty() {
            return Err(ConfigError::Invalid {
                field: "supported_post_types".into(),
                reason: "must list at least one content type".into(),
            });
        }
        if let Some(bad) = self.supported_post_types.iter().find(|t| !is_key(t)) {
            return Err(ConfigError::Invalid {
                field: "supported_post_types".into(),
                reason: format!("'{bad}' must be lowercase alphanumerics, '-' or '_'"),
            });
        }

        if self.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid {
                field: "bind_addr".into(),
                reason: format!("'{}' is not a socket address", self.bind_addr),
            });
        }

        if self.date_format.is_empty() {
            return Err(ConfigError::Missing {
                field: "date_format".into(),
                hint: "Set POSTGRID_DATE_FORMAT, e.g. '%B %-d, %Y'".into(),
            });
        }

        if self.cache_ttl_secs == 0 {
            tracing::warn!("cache_ttl_secs is 0; render cache is disabled for every request");
        }

        if self.editor_token.is_some() && self.editor_token == self.admin_token {
            tracing::warn!("editor_token and admin_token are identical; the token grants administrator capabilities");
        }

        Ok(())
    }
}

/// Same character class the host applies to content-type keys.
fn is_key(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}
