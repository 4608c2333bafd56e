//! Cascading deletes
//!
//! Each delete removes the resource's own rows first, then every descendant
//! row in every table scoped under it. Descendant resources (apis, versions,
//! specs, deployments, artifacts) block a delete unless `force` is set; the
//! caller's transaction is then dropped and nothing is removed. Tags and
//! blobs never block.

use super::client::Client;
use super::entities::{
    ApiEntity, ArtifactEntity, BlobEntity, DeploymentEntity, DeploymentRevisionTagEntity,
    ProjectEntity, SpecEntity, SpecRevisionTagEntity, VersionEntity,
};
use super::scope::{key_is, Scope};
use crate::error::{RegistryError, Result};
use registry_names::prelude::*;
use sea_orm::{Condition, ConnectionTrait, EntityTrait};
use tracing::debug;

/// Fail unless `force` is set or no descendant resources were removed
fn check_cascade(name: &str, force: bool, removed: &[(&str, u64)]) -> Result<()> {
    let total: u64 = removed.iter().map(|(_, count)| count).sum();
    if total == 0 || force {
        return Ok(());
    }
    let reason = removed
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(table, count)| format!("{table}:{count}"))
        .collect::<Vec<_>>()
        .join(" ");
    Err(RegistryError::failed_precondition(format!(
        "cannot delete child resources of {name} in non-cascading mode: {reason}"
    )))
}

impl<C: ConnectionTrait> Client<'_, C> {
    /// Delete the rows matching `cond`, or fail with `NotFound` if there are none
    async fn purge_own<E: EntityTrait>(&self, name: &str, cond: Condition) -> Result<u64> {
        match self.purge::<E>(cond).await? {
            0 => Err(RegistryError::not_found(format!("{name:?} not found"))),
            removed => Ok(removed),
        }
    }

    pub async fn delete_project(&self, name: &ProjectName, force: bool) -> Result<()> {
        let key = name.to_string();
        self.purge_own::<ProjectEntity>(&key, Condition::all().add(key_is(&key)))
            .await?;

        let scope = Scope::project(name).condition();
        let removed = [
            ("apis", self.purge::<ApiEntity>(scope.clone()).await?),
            ("versions", self.purge::<VersionEntity>(scope.clone()).await?),
            ("specs", self.purge::<SpecEntity>(scope.clone()).await?),
            ("deployments", self.purge::<DeploymentEntity>(scope.clone()).await?),
            ("artifacts", self.purge::<ArtifactEntity>(scope.clone()).await?),
        ];
        check_cascade(&key, force, &removed)?;

        self.purge::<SpecRevisionTagEntity>(scope.clone()).await?;
        self.purge::<DeploymentRevisionTagEntity>(scope.clone()).await?;
        self.purge::<BlobEntity>(scope).await?;
        debug!(project = %key, "Deleted project rows");
        Ok(())
    }

    pub async fn delete_api(&self, name: &ApiName, force: bool) -> Result<()> {
        let key = name.to_string();
        self.purge_own::<ApiEntity>(&key, Condition::all().add(key_is(&key)))
            .await?;

        let scope = Scope::api(name).condition();
        let removed = [
            ("versions", self.purge::<VersionEntity>(scope.clone()).await?),
            ("specs", self.purge::<SpecEntity>(scope.clone()).await?),
            ("deployments", self.purge::<DeploymentEntity>(scope.clone()).await?),
            ("artifacts", self.purge::<ArtifactEntity>(scope.clone()).await?),
        ];
        check_cascade(&key, force, &removed)?;

        self.purge::<SpecRevisionTagEntity>(scope.clone()).await?;
        self.purge::<DeploymentRevisionTagEntity>(scope.clone()).await?;
        self.purge::<BlobEntity>(scope).await?;
        debug!(api = %key, "Deleted api rows");
        Ok(())
    }

    pub async fn delete_version(&self, name: &VersionName, force: bool) -> Result<()> {
        let key = name.to_string();
        self.purge_own::<VersionEntity>(&key, Condition::all().add(key_is(&key)))
            .await?;

        let scope = Scope::version(name).condition();
        let removed = [
            ("specs", self.purge::<SpecEntity>(scope.clone()).await?),
            ("artifacts", self.purge::<ArtifactEntity>(scope.clone()).await?),
        ];
        check_cascade(&key, force, &removed)?;

        self.purge::<SpecRevisionTagEntity>(scope.clone()).await?;
        self.purge::<BlobEntity>(scope).await?;
        debug!(version = %key, "Deleted version rows");
        Ok(())
    }

    /// Delete every revision of a spec
    pub async fn delete_spec(&self, name: &SpecName, force: bool) -> Result<()> {
        let key = name.to_string();
        let scope = Scope::spec(name).condition();
        let revisions = self.purge_own::<SpecEntity>(&key, scope.clone()).await?;

        let removed = [("artifacts", self.purge::<ArtifactEntity>(scope.clone()).await?)];
        check_cascade(&key, force, &removed)?;

        self.purge::<SpecRevisionTagEntity>(scope.clone()).await?;
        self.purge::<BlobEntity>(scope).await?;
        debug!(spec = %key, revisions = revisions, "Deleted spec rows");
        Ok(())
    }

    /// Delete every revision of a deployment
    pub async fn delete_deployment(&self, name: &DeploymentName, force: bool) -> Result<()> {
        let key = name.to_string();
        let scope = Scope::deployment(name).condition();
        let revisions = self.purge_own::<DeploymentEntity>(&key, scope.clone()).await?;

        let removed = [("artifacts", self.purge::<ArtifactEntity>(scope.clone()).await?)];
        check_cascade(&key, force, &removed)?;

        self.purge::<DeploymentRevisionTagEntity>(scope.clone()).await?;
        self.purge::<BlobEntity>(scope).await?;
        debug!(deployment = %key, revisions = revisions, "Deleted deployment rows");
        Ok(())
    }

    /// Delete one spec revision with its tags, contents and artifacts
    ///
    /// `name` may carry a revision id or a tag. Removing the only remaining
    /// revision is rejected. Returns the revision id that was deleted.
    pub async fn delete_spec_revision(&self, name: &SpecRevisionName) -> Result<String> {
        let revision = self.spec_revision(name).await?;
        let spec = name.spec();
        let scope = Scope::spec(&spec).with_revision(&revision.revision_id).condition();

        self.purge_own::<SpecEntity>(&revision.key, Condition::all().add(key_is(&revision.key)))
            .await?;
        self.purge::<SpecRevisionTagEntity>(scope.clone()).await?;
        self.purge::<ArtifactEntity>(scope.clone()).await?;
        self.purge::<BlobEntity>(scope).await?;

        if self.current_spec(&spec).await?.is_none() {
            return Err(RegistryError::failed_precondition(format!(
                "cannot delete the only revision: {}",
                revision.key
            )));
        }
        Ok(revision.revision_id)
    }

    /// Delete one deployment revision with its tags and artifacts
    ///
    /// `name` may carry a revision id or a tag. Removing the only remaining
    /// revision is rejected. Returns the revision id that was deleted.
    pub async fn delete_deployment_revision(
        &self,
        name: &DeploymentRevisionName,
    ) -> Result<String> {
        let revision = self.deployment_revision(name).await?;
        let deployment = name.deployment();
        let scope = Scope::deployment(&deployment)
            .with_revision(&revision.revision_id)
            .condition();

        self.purge_own::<DeploymentEntity>(
            &revision.key,
            Condition::all().add(key_is(&revision.key)),
        )
        .await?;
        self.purge::<DeploymentRevisionTagEntity>(scope.clone()).await?;
        self.purge::<ArtifactEntity>(scope.clone()).await?;
        self.purge::<BlobEntity>(scope).await?;

        if self.current_deployment(&deployment).await?.is_none() {
            return Err(RegistryError::failed_precondition(format!(
                "cannot delete the only revision: {}",
                revision.key
            )));
        }
        Ok(revision.revision_id)
    }

    /// Delete the artifact stored under `key` and its contents
    pub async fn delete_artifact(&self, key: &str) -> Result<()> {
        self.purge_own::<ArtifactEntity>(key, Condition::all().add(key_is(key)))
            .await?;
        self.purge::<BlobEntity>(Condition::all().add(key_is(key)))
            .await?;
        Ok(())
    }
}
