//! # Registry
//!
//! The [`Registry`] is the entry point for every registry operation. It owns
//! the database handle, the upsert locks and the change notifier, and exposes
//! one async method per RPC:
//!
//! - [`projects`]: projects
//! - [`apis`]: apis under a project
//! - [`versions`]: versions under an api
//! - [`specs`]: spec revisions, their contents and tags
//! - [`deployments`]: deployment revisions and tags
//! - [`artifacts`]: artifacts attached to any of the above
//!
//! Each mutation runs in one database transaction; the notifier is called
//! only after the transaction commits. Dropping an operation's future before
//! it completes drops the transaction, which rolls it back.

pub mod apis;
pub mod artifacts;
pub mod deployments;
pub mod projects;
pub mod specs;
pub mod versions;

use crate::config::RegistryConfig;
use crate::constants::MAX_REVISION_ID_ATTEMPTS;
use crate::error::{RegistryError, Result};
use crate::notify::{ChangeType, LogNotifier, Notifier};
use crate::storage::entities::{ApiEntity, ProjectEntity, SpecEntity, VersionEntity};
use crate::storage::{self, Client, Scope};
use crate::upsert::UpsertLocks;
use registry_names::prelude::*;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, TransactionTrait,
};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct Registry {
    db: DatabaseConnection,
    locks: UpsertLocks,
    notifier: Arc<dyn Notifier>,
}

impl Registry {
    /// Registry over an open connection, logging changes with [`LogNotifier`]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            locks: UpsertLocks::new(),
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Connect using `config` and make sure the schema exists
    pub async fn connect(config: &RegistryConfig) -> Result<Self> {
        let db = storage::connect(config).await?;
        let registry = Self::new(db);
        registry.migrate().await?;
        Ok(registry)
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Create any missing tables and indexes
    pub async fn migrate(&self) -> Result<()> {
        Client::new(&self.db).migrate().await
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn begin(&self) -> Result<DatabaseTransaction> {
        Ok(self.db.begin().await?)
    }

    async fn notify(&self, change: ChangeType, resource: &str) {
        self.notifier.notify(change, resource).await;
    }
}

/// Reject list parents and revision names that select more than one resource
fn reject_wildcards(name: &str, has_wildcard: bool) -> Result<()> {
    if has_wildcard {
        return Err(RegistryError::invalid_argument(format!(
            "invalid name {name:?}: wildcards are only allowed in list parents"
        )));
    }
    Ok(())
}

/// Fail with `NotFound` unless the row keyed `name` exists
async fn require<E, C>(client: &Client<'_, C>, name: &str) -> Result<()>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    if client.exists::<E>(name).await? {
        Ok(())
    } else {
        Err(RegistryError::not_found(format!("{name:?} not found")))
    }
}

/// Check that the deepest concrete ancestor named by a list scope exists
///
/// Wildcarded segments and everything below them are not checked.
async fn require_list_parent<C: ConnectionTrait>(
    client: &Client<'_, C>,
    scope: &Scope<'_>,
) -> Result<()> {
    fn concrete(id: Option<&str>) -> Option<&str> {
        id.filter(|id| !id.is_empty() && !is_wildcard(id))
    }

    let Some(project_id) = concrete(scope.project_id) else {
        return Ok(());
    };
    let project = ProjectName::new(project_id);
    let Some(api_id) = concrete(scope.api_id) else {
        return require::<ProjectEntity, C>(client, &project.to_string()).await;
    };
    let api = project.api(api_id);

    if let Some(deployment_id) = concrete(scope.deployment_id) {
        let deployment = api.deployment(deployment_id);
        debug!(parent = %deployment, "Checking list parent");
        return match client.current_deployment(&deployment).await? {
            Some(_) => Ok(()),
            None => Err(RegistryError::not_found(format!("{:?} not found", deployment.to_string()))),
        };
    }

    let Some(version_id) = concrete(scope.version_id) else {
        return require::<ApiEntity, C>(client, &api.to_string()).await;
    };
    let version = api.version(version_id);
    let Some(spec_id) = concrete(scope.spec_id) else {
        return require::<VersionEntity, C>(client, &version.to_string()).await;
    };
    let spec = version.spec(spec_id);
    if client
        .count::<SpecEntity>(Scope::spec(&spec).condition())
        .await?
        > 0
    {
        Ok(())
    } else {
        Err(RegistryError::not_found(format!("{:?} not found", spec.to_string())))
    }
}

/// A new revision id that is neither a revision id nor a tag of the resource
///
/// Revisions (`E`) and tags (`T`) share the key form `key_of(id)`, and a
/// revision id would shadow a tag of the same name in `name@x` lookups.
async fn fresh_revision_id<E, T, C, F>(client: &Client<'_, C>, key_of: F) -> Result<String>
where
    E: EntityTrait,
    E::Model: Sync,
    T: EntityTrait,
    T::Model: Sync,
    C: ConnectionTrait,
    F: Fn(&str) -> String,
{
    let candidates =
        std::iter::repeat_with(storage::new_revision_id).take(MAX_REVISION_ID_ATTEMPTS);
    first_unused::<E, T, C, F>(client, key_of, candidates).await
}

async fn first_unused<E, T, C, F>(
    client: &Client<'_, C>,
    key_of: F,
    candidates: impl Iterator<Item = String>,
) -> Result<String>
where
    E: EntityTrait,
    E::Model: Sync,
    T: EntityTrait,
    T::Model: Sync,
    C: ConnectionTrait,
    F: Fn(&str) -> String,
{
    for revision_id in candidates {
        let key = key_of(&revision_id);
        if client.exists::<E>(&key).await? || client.exists::<T>(&key).await? {
            debug!(revision_id = %revision_id, "Revision id already taken, drawing another");
            continue;
        }
        return Ok(revision_id);
    }
    Err(RegistryError::internal("could not allocate an unused revision id"))
}
