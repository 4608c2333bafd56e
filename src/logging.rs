//! # Logging
//!
//! Installs the global `tracing` subscriber.
//!
//! `RUST_LOG` wins when set; otherwise the level from [`RegistryConfig`] applies
//! to this crate and to the SQL driver.

use crate::config::RegistryConfig;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber (text or JSON) with an env filter
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init(config: &RegistryConfig) {
    let level = config.log_level.to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let sql = if config.sql_logging { "debug" } else { "warn" };
        EnvFilter::new(format!(
            "api_registry={level},registry_admin={level},sea_orm={sql},sqlx={sql}"
        ))
    });

    let result = if config.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if let Err(e) = result {
        tracing::debug!("Tracing subscriber already installed: {}", e);
    }
}
