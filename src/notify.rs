//! # Change notifications
//!
//! The registry calls a [`Notifier`] after every committed mutation. Delivery
//! (pub/sub, webhooks) belongs to the implementation; the registry never waits
//! on or reacts to delivery failures.

use async_trait::async_trait;
use std::fmt;
use tracing::info;

/// Kind of change being announced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Created => write!(f, "CREATED"),
            ChangeType::Updated => write!(f, "UPDATED"),
            ChangeType::Deleted => write!(f, "DELETED"),
        }
    }
}

/// Receives one call per committed mutation
#[async_trait]
pub trait Notifier: Send + Sync + fmt::Debug {
    async fn notify(&self, change: ChangeType, resource: &str);
}

/// Default notifier: writes each change to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, change: ChangeType, resource: &str) {
        info!(change = %change, resource = resource, "Registry change");
    }
}
