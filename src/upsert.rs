//! # Upsert coordination
//!
//! An allow-missing update is "get, and create if absent". Two such requests
//! racing on the same missing name would both try to create it. The
//! [`UpsertLocks`] owned by each [`crate::Registry`] serialize that critical
//! section per resource kind for the lifetime of the process, so the loser
//! reads the winner's committed row and proceeds as an ordinary update.
//!
//! The locks are process-local. Several instances sharing one database are
//! covered by the retry in the registry: a create that fails with
//! `AlreadyExists` is retried as an update, up to
//! [`crate::constants::MAX_UPSERT_ATTEMPTS`] times.

use crate::constants::MAX_UPSERT_ATTEMPTS;
use crate::error::Result;
use std::future::Future;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};

/// Resource kinds with their own upsert critical section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Project,
    Api,
    Version,
    Spec,
    Deployment,
    Artifact,
}

/// One mutex per resource kind
#[derive(Debug, Default)]
pub struct UpsertLocks {
    projects: Mutex<()>,
    apis: Mutex<()>,
    versions: Mutex<()>,
    specs: Mutex<()>,
    deployments: Mutex<()>,
    artifacts: Mutex<()>,
}

impl UpsertLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the critical section for `kind`; it ends when the guard drops
    pub async fn lock(&self, kind: ResourceKind) -> MutexGuard<'_, ()> {
        trace!(kind = ?kind, "Acquiring upsert lock");
        match kind {
            ResourceKind::Project => self.projects.lock().await,
            ResourceKind::Api => self.apis.lock().await,
            ResourceKind::Version => self.versions.lock().await,
            ResourceKind::Spec => self.specs.lock().await,
            ResourceKind::Deployment => self.deployments.lock().await,
            ResourceKind::Artifact => self.artifacts.lock().await,
        }
    }
}

/// Run `attempt` until it stops failing with `AlreadyExists`
///
/// An allow-missing update that loses a create race to another process sees
/// `AlreadyExists`; the next attempt finds the winner's row and updates it.
pub async fn retry_upsert<T, F, Fut>(resource: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts = 1;
    loop {
        match attempt().await {
            Err(e) if e.is_already_exists() && attempts < MAX_UPSERT_ATTEMPTS => {
                debug!(
                    resource = resource,
                    attempt = attempts,
                    "Lost create race, retrying as update"
                );
                attempts += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_kinds_are_independent() {
        let locks = UpsertLocks::new();
        let _specs = locks.lock(ResourceKind::Spec).await;
        // A different kind is not blocked by the held spec lock.
        let apis = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            locks.lock(ResourceKind::Api),
        )
        .await;
        assert!(apis.is_ok(), "api lock should be free while spec lock is held");

        let specs_again = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            locks.lock(ResourceKind::Spec),
        )
        .await;
        assert!(specs_again.is_err(), "spec lock should still be held");
    }

    #[tokio::test]
    async fn test_retry_upsert_recovers_from_lost_race() {
        let calls = &AtomicUsize::new(0);
        let result = retry_upsert("projects/p", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(RegistryError::already_exists("projects/p"))
            } else {
                Ok("updated")
            }
        })
        .await;
        assert_eq!(result.expect("second attempt succeeds"), "updated");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_upsert_gives_up() {
        let calls = &AtomicUsize::new(0);
        let result: Result<()> = retry_upsert("projects/p", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RegistryError::already_exists("projects/p"))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_UPSERT_ATTEMPTS);

        let calls = &AtomicUsize::new(0);
        let result: Result<()> = retry_upsert("projects/p", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RegistryError::not_found("projects/p"))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1, "other errors are not retried");
    }
}
