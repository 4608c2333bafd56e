//! # Storage
//!
//! Row-level access to the registry tables through SeaORM. Everything here is
//! generic over [`sea_orm::ConnectionTrait`], so the same [`Client`] runs on a
//! pooled connection or inside a transaction.
//!
//! - [`entities`]: table definitions
//! - [`client`]: the [`Client`] handle and schema migration
//! - [`scope`]: id-scoped conditions shared by listing and deletion
//! - [`revisions`]: current-revision lookup, tag resolution and tagging
//! - [`blobs`]: content blobs for spec revisions and artifacts
//! - [`delete`]: cascading deletes

pub mod blobs;
pub mod client;
pub mod delete;
pub mod entities;
pub mod revisions;
pub mod scope;

pub use client::Client;
pub use scope::Scope;

use crate::config::RegistryConfig;
use crate::constants::REVISION_ID_LENGTH;
use crate::error::Result;
use chrono::{DateTime, Duration as ChronoDuration, SubsecRound, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// Open a connection pool for `config`
///
/// An in-memory SQLite database exists per connection, so its pool is pinned
/// to a single long-lived connection.
pub async fn connect(config: &RegistryConfig) -> Result<DatabaseConnection> {
    info!(
        url = %mask_connection_string(&config.database_url),
        "Connecting to registry database"
    );

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.connect_timeout(config.connect_timeout())
        .acquire_timeout(config.acquire_timeout())
        .sqlx_logging(config.sql_logging);

    if config.is_in_memory() {
        opt.max_connections(1)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(u64::from(u32::MAX)))
            .max_lifetime(Duration::from_secs(u64::from(u32::MAX)));
    } else {
        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(3600));
    }

    let conn = Database::connect(opt).await?;
    conn.ping().await?;
    info!("Registry database connection established");
    Ok(conn)
}

/// Current time at the precision every backend stores (microseconds)
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A creation time strictly after `previous`, so the newest revision is unambiguous
pub fn revision_time_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + ChronoDuration::microseconds(1)
    }
}

/// Fresh revision id: the tail of a random UUID
pub fn new_revision_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[id.len() - REVISION_ID_LENGTH..].to_string()
}

/// Hide credentials in a connection string for logging
fn mask_connection_string(url: &str) -> String {
    match (url.find("//"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}****{}", &url[..scheme_end + 2], &url[at..])
        }
        _ => url.to_string(),
    }
}
