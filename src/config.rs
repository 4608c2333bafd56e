//! # Registry Configuration
//!
//! Storage and logging settings loaded from environment variables.

use crate::constants::{
    DEFAULT_ACQUIRE_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_DATABASE_URL,
    DEFAULT_MAX_CONNECTIONS, DEFAULT_MIN_CONNECTIONS,
};
use std::time::Duration;

/// Registry-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Database connection URL (`postgres://...` or `sqlite:...`)
    pub database_url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// Minimum pooled connections kept open
    pub min_connections: u32,
    /// Timeout for establishing a connection (seconds)
    pub connect_timeout_secs: u64,
    /// Timeout for acquiring a pooled connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Log every SQL statement at debug level
    pub sql_logging: bool,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            sql_logging: false,
            log_level: "INFO".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl RegistryConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            database_url: env_var_or_default_str("REGISTRY_DATABASE_URL", DEFAULT_DATABASE_URL),
            max_connections: env_var_or_default(
                "REGISTRY_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            ),
            min_connections: env_var_or_default(
                "REGISTRY_MIN_CONNECTIONS",
                DEFAULT_MIN_CONNECTIONS,
            ),
            connect_timeout_secs: env_var_or_default(
                "REGISTRY_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            ),
            acquire_timeout_secs: env_var_or_default(
                "REGISTRY_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
            ),
            sql_logging: env_var_or_default_bool("REGISTRY_SQL_LOGGING", false),
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            log_format: env_var_or_default_str("LOG_FORMAT", "text"),
        }
    }

    /// Configuration for a fresh in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Same configuration pointed at another database
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    /// True when the URL names an in-memory SQLite database
    pub fn is_in_memory(&self) -> bool {
        self.database_url.starts_with("sqlite") && self.database_url.contains(":memory:")
    }

    /// Get connect timeout duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Get acquire timeout duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
