//! Revision lookup and tagging for specs and deployments
//!
//! A revisioned resource has one row per revision; the current revision is
//! the row with the latest `revision_create_time`. A revision reference
//! (`name@token`) resolves the token as a revision id first and as a tag of
//! the same resource second.

use super::client::Client;
use super::entities::{
    deployment, deployment_revision_tag, spec, spec_revision_tag, DeploymentEntity,
    DeploymentRevisionTagEntity, SpecEntity, SpecRevisionTagEntity,
};
use super::scope::Scope;
use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};
use registry_names::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::debug;

impl<C: ConnectionTrait> Client<'_, C> {
    /// Current revision of a spec, if the spec exists
    pub async fn current_spec(&self, name: &SpecName) -> Result<Option<spec::Model>> {
        Ok(SpecEntity::find()
            .filter(Scope::spec(name).condition())
            .order_by_desc(spec::Column::RevisionCreateTime)
            .one(self.conn())
            .await?)
    }

    /// Every revision of a spec, newest first
    pub async fn spec_revisions(&self, name: &SpecName) -> Result<Vec<spec::Model>> {
        Ok(SpecEntity::find()
            .filter(Scope::spec(name).condition())
            .order_by_desc(spec::Column::RevisionCreateTime)
            .all(self.conn())
            .await?)
    }

    /// Resolve a bare name, `name@revision` or `name@tag` to one revision row
    pub async fn spec_revision(&self, name: &SpecRevisionName) -> Result<spec::Model> {
        let spec = name.spec();
        if !name.has_revision() {
            return self
                .current_spec(&spec)
                .await?
                .ok_or_else(|| RegistryError::not_found(format!("{:?} not found", spec.to_string())));
        }

        if let Some(row) = self.find::<SpecEntity>(&name.to_string()).await? {
            return Ok(row);
        }

        let tag_key = spec.tag(&name.revision_id).revision_name();
        if let Some(tag) = self.find::<SpecRevisionTagEntity>(&tag_key).await? {
            debug!(tag = %tag_key, revision_id = %tag.revision_id, "Resolved spec revision tag");
            let target = spec.revision(tag.revision_id);
            return self.get::<SpecEntity>(&target.to_string(), &name.to_string()).await;
        }

        Err(RegistryError::not_found(format!(
            "spec revision {:?} not found",
            name.to_string()
        )))
    }

    /// Tags currently pointing at one spec revision, sorted
    pub async fn spec_revision_tags(&self, revision: &spec::Model) -> Result<Vec<String>> {
        let spec = SpecName::new(
            &revision.project_id,
            &revision.api_id,
            &revision.version_id,
            &revision.spec_id,
        );
        let mut tags: Vec<String> = self
            .all::<SpecRevisionTagEntity>(Scope::spec(&spec).with_revision(&revision.revision_id).condition())
            .await?
            .into_iter()
            .map(|row| row.tag)
            .collect();
        tags.sort();
        Ok(tags)
    }

    /// Point `tag` at `revision`, moving it if it already exists
    pub async fn put_spec_revision_tag(
        &self,
        revision: &spec::Model,
        tag: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let spec = SpecName::new(
            &revision.project_id,
            &revision.api_id,
            &revision.version_id,
            &revision.spec_id,
        );
        if self.exists::<SpecEntity>(&spec.revision(tag).to_string()).await? {
            return Err(RegistryError::invalid_argument(format!(
                "invalid tag {tag:?}: a revision of {spec} already has this id"
            )));
        }

        let key = spec.tag(tag).revision_name();
        let row = match self.find::<SpecRevisionTagEntity>(&key).await? {
            Some(existing) => spec_revision_tag::Model {
                revision_id: revision.revision_id.clone(),
                update_time: now,
                ..existing
            },
            None => spec_revision_tag::Model {
                key: key.clone(),
                project_id: revision.project_id.clone(),
                api_id: revision.api_id.clone(),
                version_id: revision.version_id.clone(),
                spec_id: revision.spec_id.clone(),
                revision_id: revision.revision_id.clone(),
                tag: tag.to_string(),
                create_time: now,
                update_time: now,
            },
        };

        if !self.update(&key, row.clone().into_active()).await? {
            self.insert(row.into_active()).await?;
        }
        Ok(())
    }

    /// Current revision of a deployment, if the deployment exists
    pub async fn current_deployment(
        &self,
        name: &DeploymentName,
    ) -> Result<Option<deployment::Model>> {
        Ok(DeploymentEntity::find()
            .filter(Scope::deployment(name).condition())
            .order_by_desc(deployment::Column::RevisionCreateTime)
            .one(self.conn())
            .await?)
    }

    /// Every revision of a deployment, newest first
    pub async fn deployment_revisions(
        &self,
        name: &DeploymentName,
    ) -> Result<Vec<deployment::Model>> {
        Ok(DeploymentEntity::find()
            .filter(Scope::deployment(name).condition())
            .order_by_desc(deployment::Column::RevisionCreateTime)
            .all(self.conn())
            .await?)
    }

    /// Resolve a bare name, `name@revision` or `name@tag` to one revision row
    pub async fn deployment_revision(
        &self,
        name: &DeploymentRevisionName,
    ) -> Result<deployment::Model> {
        let deployment = name.deployment();
        if !name.has_revision() {
            return self.current_deployment(&deployment).await?.ok_or_else(|| {
                RegistryError::not_found(format!("{:?} not found", deployment.to_string()))
            });
        }

        if let Some(row) = self.find::<DeploymentEntity>(&name.to_string()).await? {
            return Ok(row);
        }

        let tag_key = deployment.tag(&name.revision_id).revision_name();
        if let Some(tag) = self.find::<DeploymentRevisionTagEntity>(&tag_key).await? {
            debug!(tag = %tag_key, revision_id = %tag.revision_id, "Resolved deployment revision tag");
            let target = deployment.revision(tag.revision_id);
            return self
                .get::<DeploymentEntity>(&target.to_string(), &name.to_string())
                .await;
        }

        Err(RegistryError::not_found(format!(
            "deployment revision {:?} not found",
            name.to_string()
        )))
    }

    /// Tags currently pointing at one deployment revision, sorted
    pub async fn deployment_revision_tags(&self, revision: &deployment::Model) -> Result<Vec<String>> {
        let deployment = DeploymentName::new(
            &revision.project_id,
            &revision.api_id,
            &revision.deployment_id,
        );
        let mut tags: Vec<String> = self
            .all::<DeploymentRevisionTagEntity>(
                Scope::deployment(&deployment)
                    .with_revision(&revision.revision_id)
                    .condition(),
            )
            .await?
            .into_iter()
            .map(|row| row.tag)
            .collect();
        tags.sort();
        Ok(tags)
    }

    /// Point `tag` at `revision`, moving it if it already exists
    pub async fn put_deployment_revision_tag(
        &self,
        revision: &deployment::Model,
        tag: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let deployment = DeploymentName::new(
            &revision.project_id,
            &revision.api_id,
            &revision.deployment_id,
        );
        if self
            .exists::<DeploymentEntity>(&deployment.revision(tag).to_string())
            .await?
        {
            return Err(RegistryError::invalid_argument(format!(
                "invalid tag {tag:?}: a revision of {deployment} already has this id"
            )));
        }

        let key = deployment.tag(tag).revision_name();
        let row = match self.find::<DeploymentRevisionTagEntity>(&key).await? {
            Some(existing) => deployment_revision_tag::Model {
                revision_id: revision.revision_id.clone(),
                update_time: now,
                ..existing
            },
            None => deployment_revision_tag::Model {
                key: key.clone(),
                project_id: revision.project_id.clone(),
                api_id: revision.api_id.clone(),
                deployment_id: revision.deployment_id.clone(),
                revision_id: revision.revision_id.clone(),
                tag: tag.to_string(),
                create_time: now,
                update_time: now,
            },
        };

        if !self.update(&key, row.clone().into_active()).await? {
            self.insert(row.into_active()).await?;
        }
        Ok(())
    }
}
