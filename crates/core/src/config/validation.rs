//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::cache::naming::validate_version;
use crate::config::AppConfig;
use thiserror::Error;

/// Upper bound for the dynamic store's entry count.
const MAX_DYNAMIC_ENTRIES: usize = 100_000;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - `cache_prefix` is empty or contains whitespace
    /// - `version` is empty or contains `-` or whitespace
    /// - `max_dynamic_entries` is 0 or exceeds 100000
    /// - `max_bytes` is 0 or exceeds 100MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.origin_url()?;

        if self.cache_prefix.is_empty() || self.cache_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "cache_prefix".into(),
                reason: "must be non-empty without whitespace".into(),
            });
        }

        validate_version(&self.version)
            .map_err(|reason| ConfigError::Invalid { field: "version".into(), reason: reason.into() })?;

        if self.max_dynamic_entries == 0 {
            return Err(ConfigError::Invalid {
                field: "max_dynamic_entries".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_dynamic_entries > MAX_DYNAMIC_ENTRIES {
            return Err(ConfigError::Invalid {
                field: "max_dynamic_entries".into(),
                reason: format!("must not exceed {MAX_DYNAMIC_ENTRIES}"),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 100 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 100MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        for host in &self.font_hosts {
            if self.translate_hosts.contains(host) || self.analytics_hosts.contains(host) {
                tracing::warn!(
                    host = host.as_str(),
                    "Host is listed as a font host and a network-only host; \
                     network-only takes precedence"
                );
            }
        }

        Ok(())
    }
}
