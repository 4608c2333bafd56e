//! Artifact operations
//!
//! An artifact under a spec or deployment is stored against one concrete
//! revision. Names without a revision (or with a tag) are pinned to the
//! revision they currently resolve to, and the stored name always carries the
//! revision id.

use super::{reject_wildcards, require, require_list_parent, Registry};
use crate::error::{RegistryError, Result};
use crate::mask::FieldMask;
use crate::models::{
    artifact, check_compression, content_hash, content_size, labels_to_json, Artifact, Contents,
    ListRequest, ListResponse,
};
use crate::notify::ChangeType;
use crate::pagination::{Filterable, Page};
use crate::storage::blobs::artifact_blob;
use crate::storage::entities::{
    artifact as artifact_row, ApiEntity, ArtifactEntity, ProjectEntity, VersionEntity,
};
use crate::storage::scope::{
    artifacts_of_current_deployment_revision, artifacts_of_current_spec_revision,
};
use crate::storage::{self, Client, Scope};
use crate::upsert::{retry_upsert, ResourceKind};
use registry_names::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter};
use tracing::{debug, info};

impl Registry {
    /// Create an artifact under any artifact parent
    pub async fn create_artifact(
        &self,
        parent: &str,
        artifact_id: &str,
        body: &Artifact,
    ) -> Result<Artifact> {
        let parent = ArtifactParent::parse(parent)?;
        reject_wildcards(&parent.to_string(), parent.has_wildcard())?;
        let name = parent.artifact(artifact_id);
        name.validate()?;

        let txn = self.begin().await?;
        let created = create_in(&Client::new(&txn), &name, body).await?;
        txn.commit().await?;

        info!(resource = %created.name, operation = "create_artifact", "Created artifact");
        self.notify(ChangeType::Created, &created.name).await;
        Ok(created)
    }

    pub async fn get_artifact(&self, name: &str) -> Result<Artifact> {
        let name = ArtifactName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;
        let row = find_artifact(&Client::new(&self.db), &name).await?;
        Ok(Artifact::from_row(&row))
    }

    /// Raw contents of an artifact, exactly as stored
    pub async fn get_artifact_contents(&self, name: &str) -> Result<Contents> {
        let name = ArtifactName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;

        let client = Client::new(&self.db);
        let row = find_artifact(&client, &name).await?;
        let blob = client.get_blob(&row.key, &row.key).await?;
        Ok(Contents {
            mime_type: row.mime_type,
            data: blob.contents,
        })
    }

    /// List artifacts attached directly to a parent
    ///
    /// Any parent segment may be `-`. Under a spec or deployment without a
    /// revision, only artifacts of the current revision are listed; `@-`
    /// lists those of every revision.
    pub async fn list_artifacts(&self, request: &ListRequest) -> Result<ListResponse<Artifact>> {
        let client = Client::new(&self.db);
        let parent = list_parent(&client, ArtifactParent::parse(&request.parent)?).await?;
        let page = Page::new(request, artifact_row::Model::FIELDS, artifact::DEFAULT_ORDER)?;
        let scope = Scope::artifacts_of(&parent);
        require_list_parent(&client, &scope).await?;

        let mut query = ArtifactEntity::find().filter(scope.condition());
        if parent.revision_id().is_empty() {
            match &parent {
                ArtifactParent::Spec(_) => {
                    query = query.filter(artifacts_of_current_spec_revision());
                }
                ArtifactParent::Deployment(_) => {
                    query = query.filter(artifacts_of_current_deployment_revision());
                }
                _ => {}
            }
        }
        let (rows, next_page_token) = page.scan(&self.db, query).await?;
        Ok(ListResponse {
            items: rows.iter().map(Artifact::from_row).collect(),
            next_page_token,
        })
    }

    /// Update the artifact named by `body.name`
    ///
    /// With `allow_missing`, an artifact that does not exist is created instead.
    pub async fn update_artifact(
        &self,
        body: &Artifact,
        mask: Option<&FieldMask>,
        allow_missing: bool,
    ) -> Result<Artifact> {
        let name = &ArtifactName::parse(&body.name)?;
        reject_wildcards(&body.name, name.has_wildcard())?;

        let (artifact, change) = if allow_missing {
            let _guard = self.locks.lock(ResourceKind::Artifact).await;
            retry_upsert(&body.name, || self.save_artifact(name, body, mask, true)).await?
        } else {
            self.save_artifact(name, body, mask, false).await?
        };

        info!(
            resource = %artifact.name,
            operation = "update_artifact",
            change = %change,
            "Saved artifact"
        );
        self.notify(change, &artifact.name).await;
        Ok(artifact)
    }

    /// Overwrite the contents and metadata of an existing artifact
    ///
    /// Fields left unset in `body` are cleared.
    pub async fn replace_artifact(&self, body: &Artifact) -> Result<Artifact> {
        self.update_artifact(body, Some(&FieldMask::all()), false)
            .await
    }

    async fn save_artifact(
        &self,
        name: &ArtifactName,
        body: &Artifact,
        mask: Option<&FieldMask>,
        allow_missing: bool,
    ) -> Result<(Artifact, ChangeType)> {
        let txn = self.begin().await?;
        let client = Client::new(&txn);
        let pinned = pin(&client, name).await?;
        let key = pinned.to_string();

        let saved = match client.find::<ArtifactEntity>(&key).await? {
            Some(row) => (update_in(&client, row, body, mask).await?, ChangeType::Updated),
            None if allow_missing => {
                name.validate()?;
                (create_in(&client, name, body).await?, ChangeType::Created)
            }
            None => return Err(RegistryError::not_found(format!("{:?} not found", name.to_string()))),
        };

        txn.commit().await?;
        Ok(saved)
    }

    pub async fn delete_artifact(&self, name: &str) -> Result<()> {
        let name = ArtifactName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;

        let txn = self.begin().await?;
        let client = Client::new(&txn);
        let key = pin(&client, &name).await?.to_string();
        client.delete_artifact(&key).await?;
        txn.commit().await?;

        info!(resource = %key, operation = "delete_artifact", "Deleted artifact");
        self.notify(ChangeType::Deleted, &key).await;
        Ok(())
    }
}

/// Resolve `parent` to an existing resource, pinning specs and deployments to a revision
async fn pin_parent<C: ConnectionTrait>(
    client: &Client<'_, C>,
    parent: &ArtifactParent,
) -> Result<ArtifactParent> {
    match parent {
        ArtifactParent::Project(project) => {
            require::<ProjectEntity, C>(client, &project.to_string()).await?;
        }
        ArtifactParent::Api(api) => require::<ApiEntity, C>(client, &api.to_string()).await?,
        ArtifactParent::Version(version) => {
            require::<VersionEntity, C>(client, &version.to_string()).await?;
        }
        ArtifactParent::Spec(spec) => {
            let revision = client.spec_revision(spec).await?;
            return Ok(parent.with_revision(&revision.revision_id));
        }
        ArtifactParent::Deployment(deployment) => {
            let revision = client.deployment_revision(deployment).await?;
            return Ok(parent.with_revision(&revision.revision_id));
        }
    }
    Ok(parent.clone())
}

/// The stored name of `name`: its parent pinned to a concrete revision
async fn pin<C: ConnectionTrait>(client: &Client<'_, C>, name: &ArtifactName) -> Result<ArtifactName> {
    let parent = pin_parent(client, &name.parent).await?;
    Ok(parent.artifact(name.artifact_id.clone()))
}

async fn find_artifact<C: ConnectionTrait>(
    client: &Client<'_, C>,
    name: &ArtifactName,
) -> Result<artifact_row::Model> {
    let key = pin(client, name).await?.to_string();
    client.get::<ArtifactEntity>(&key, &name.to_string()).await
}

/// Pin a concrete `spec@tag` or `deployment@revision` list parent to its revision id
///
/// Parents with wildcards or without a revision are listed as given.
async fn list_parent<C: ConnectionTrait>(
    client: &Client<'_, C>,
    parent: ArtifactParent,
) -> Result<ArtifactParent> {
    if parent.has_wildcard() || parent.revision_id().is_empty() {
        return Ok(parent);
    }
    let pinned = pin_parent(client, &parent).await?;
    debug!(parent = %parent, pinned = %pinned, "Pinned list parent");
    Ok(pinned)
}

async fn create_in<C: ConnectionTrait>(
    client: &Client<'_, C>,
    name: &ArtifactName,
    body: &Artifact,
) -> Result<Artifact> {
    let name = pin(client, name).await?;
    let key = name.to_string();
    if client.exists::<ArtifactEntity>(&key).await? {
        return Err(RegistryError::already_exists(format!("{key:?} already exists")));
    }
    check_compression(&body.mime_type, &body.contents)?;

    let mut artifact = body.clone();
    let contents = std::mem::take(&mut artifact.contents);
    artifact.size_bytes = content_size(&contents);
    artifact.hash = content_hash(&contents);
    let now = storage::now();
    let row = artifact.to_row(&name, now, now);
    client.insert(row.clone().into_active()).await?;
    client.put_blob(artifact_blob(&row, contents, now)).await?;
    Ok(Artifact::from_row(&row))
}

async fn update_in<C: ConnectionTrait>(
    client: &Client<'_, C>,
    current: artifact_row::Model,
    body: &Artifact,
    mask: Option<&FieldMask>,
) -> Result<Artifact> {
    let mut artifact = Artifact::from_row(&current);
    let paths = FieldMask::apply(mask, &mut artifact, body)?;
    let now = storage::now();

    let contents = if paths.contains(&"contents") {
        check_compression(&artifact.mime_type, &artifact.contents)?;
        Some(std::mem::take(&mut artifact.contents))
    } else {
        if artifact.mime_type != current.mime_type {
            let blob = client.get_blob(&current.key, &current.key).await?;
            check_compression(&artifact.mime_type, &blob.contents)?;
        }
        None
    };

    let row = artifact_row::Model {
        mime_type: artifact.mime_type,
        size_bytes: contents.as_deref().map_or(current.size_bytes, content_size),
        hash: contents
            .as_deref()
            .map_or_else(|| current.hash.clone(), content_hash),
        labels: labels_to_json(&artifact.labels),
        annotations: labels_to_json(&artifact.annotations),
        update_time: now,
        ..current
    };
    client.update(&row.key, row.clone().into_active()).await?;
    if let Some(contents) = contents {
        client.put_blob(artifact_blob(&row, contents, now)).await?;
    }
    Ok(Artifact::from_row(&row))
}
