//! Deployment operations
//!
//! Deployments are revisioned like specs, but their content is the spec
//! revision they serve: changing `api_spec_revision` creates a new revision,
//! anything else rewrites the current one.

use super::{fresh_revision_id, reject_wildcards, require, require_list_parent, Registry};
use crate::error::{RegistryError, Result};
use crate::mask::FieldMask;
use crate::models::{deployment, ApiDeployment, ListRequest, ListResponse};
use crate::notify::ChangeType;
use crate::pagination::{Filterable, OrderBy, Page};
use crate::storage::entities::{
    deployment as deployment_row, ApiEntity, DeploymentEntity, DeploymentRevisionTagEntity,
};
use crate::storage::scope::current_deployment_revision;
use crate::storage::{self, Client, Scope};
use crate::upsert::{retry_upsert, ResourceKind};
use registry_names::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter};
use tracing::{debug, info};

const REVISION_ORDER: &[OrderBy] = &[OrderBy::desc("revision_create_time")];

/// The served spec revision, when set, must name a spec (optionally at a revision)
fn check_api_spec_revision(body: &ApiDeployment) -> Result<()> {
    if !body.api_spec_revision.is_empty() {
        SpecRevisionName::parse(&body.api_spec_revision).map_err(|e| {
            RegistryError::invalid_argument(format!(
                "invalid api_spec_revision {:?}: {e}",
                body.api_spec_revision
            ))
        })?;
    }
    Ok(())
}

impl Registry {
    /// Create a deployment under the api `parent` with its first revision
    pub async fn create_api_deployment(
        &self,
        parent: &str,
        deployment_id: &str,
        body: &ApiDeployment,
    ) -> Result<ApiDeployment> {
        let name = ApiName::parse(parent)?.deployment(deployment_id);
        name.validate()?;
        check_api_spec_revision(body)?;

        let txn = self.begin().await?;
        let created = create_in(&Client::new(&txn), &name, body).await?;
        txn.commit().await?;

        info!(
            resource = %name,
            revision_id = %created.revision_id,
            operation = "create_api_deployment",
            "Created deployment"
        );
        self.notify(ChangeType::Created, &created.name).await;
        Ok(created)
    }

    /// Get the current revision, or the revision named by `name@revision` or `name@tag`
    pub async fn get_api_deployment(&self, name: &str) -> Result<ApiDeployment> {
        let name = DeploymentRevisionName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;

        let client = Client::new(&self.db);
        let row = client.deployment_revision(&name).await?;
        let tags = client.deployment_revision_tags(&row).await?;
        Ok(ApiDeployment::from_row(&row, name.to_string(), tags))
    }

    /// List the current revision of every deployment under an api
    pub async fn list_api_deployments(
        &self,
        request: &ListRequest,
    ) -> Result<ListResponse<ApiDeployment>> {
        let parent = ApiName::parse(&request.parent)?;
        let page = Page::new(
            request,
            deployment_row::Model::FIELDS,
            deployment::DEFAULT_ORDER,
        )?;
        let scope = Scope::api(&parent);
        let client = Client::new(&self.db);
        require_list_parent(&client, &scope).await?;

        let query = DeploymentEntity::find()
            .filter(scope.condition())
            .filter(current_deployment_revision());
        let (rows, next_page_token) = page.scan(&self.db, query).await?;
        Ok(ListResponse {
            items: messages(&client, rows, false).await?,
            next_page_token,
        })
    }

    /// List revisions of a deployment, newest first
    pub async fn list_api_deployment_revisions(
        &self,
        request: &ListRequest,
    ) -> Result<ListResponse<ApiDeployment>> {
        let parent = DeploymentRevisionName::parse(&request.parent)?.deployment();
        let page = Page::new(request, deployment_row::Model::FIELDS, REVISION_ORDER)?;
        let scope = Scope::deployment(&parent);
        let client = Client::new(&self.db);
        require_list_parent(&client, &scope).await?;

        let query = DeploymentEntity::find().filter(scope.condition());
        let (rows, next_page_token) = page.scan(&self.db, query).await?;
        Ok(ListResponse {
            items: messages(&client, rows, true).await?,
            next_page_token,
        })
    }

    /// Update the deployment named by `body.name`
    ///
    /// With `allow_missing`, a deployment that does not exist is created instead.
    pub async fn update_api_deployment(
        &self,
        body: &ApiDeployment,
        mask: Option<&FieldMask>,
        allow_missing: bool,
    ) -> Result<ApiDeployment> {
        let name = &DeploymentName::parse(&body.name)?;
        reject_wildcards(&body.name, name.has_wildcard())?;

        let (deployment, change) = if allow_missing {
            let _guard = self.locks.lock(ResourceKind::Deployment).await;
            retry_upsert(&body.name, || self.save_api_deployment(name, body, mask, true)).await?
        } else {
            self.save_api_deployment(name, body, mask, false).await?
        };

        info!(
            resource = %name,
            revision_id = %deployment.revision_id,
            operation = "update_api_deployment",
            change = %change,
            "Saved deployment"
        );
        self.notify(change, &deployment.name).await;
        Ok(deployment)
    }

    async fn save_api_deployment(
        &self,
        name: &DeploymentName,
        body: &ApiDeployment,
        mask: Option<&FieldMask>,
        allow_missing: bool,
    ) -> Result<(ApiDeployment, ChangeType)> {
        let txn = self.begin().await?;
        let client = Client::new(&txn);

        let saved = match client.current_deployment(name).await? {
            Some(current) => (
                update_in(&client, name, current, body, mask).await?,
                ChangeType::Updated,
            ),
            None if allow_missing => {
                name.validate()?;
                check_api_spec_revision(body)?;
                (create_in(&client, name, body).await?, ChangeType::Created)
            }
            None => {
                return Err(RegistryError::not_found(format!(
                    "{:?} not found",
                    name.to_string()
                )))
            }
        };

        txn.commit().await?;
        Ok(saved)
    }

    /// Delete a deployment and all of its revisions; with `force`, its artifacts go too
    pub async fn delete_api_deployment(&self, name: &str, force: bool) -> Result<()> {
        let name = DeploymentName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;

        let txn = self.begin().await?;
        Client::new(&txn).delete_deployment(&name, force).await?;
        txn.commit().await?;

        info!(
            resource = %name,
            operation = "delete_api_deployment",
            force = force,
            "Deleted deployment"
        );
        self.notify(ChangeType::Deleted, &name.to_string()).await;
        Ok(())
    }

    /// Point `tag` at the deployment revision named by `name`
    pub async fn tag_api_deployment_revision(
        &self,
        name: &str,
        tag: &str,
    ) -> Result<ApiDeployment> {
        validate_revision_tag(tag)?;
        let name = DeploymentRevisionName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;

        let txn = self.begin().await?;
        let client = Client::new(&txn);
        let revision = client.deployment_revision(&name).await?;
        client
            .put_deployment_revision_tag(&revision, tag, storage::now())
            .await?;
        let tags = client.deployment_revision_tags(&revision).await?;
        txn.commit().await?;

        info!(
            resource = %revision.key,
            tag = tag,
            operation = "tag_api_deployment_revision",
            "Tagged deployment revision"
        );
        self.notify(ChangeType::Updated, &revision.key).await;
        let tagged = name.deployment().tag(tag).revision_name();
        Ok(ApiDeployment::from_row(&revision, tagged, tags))
    }

    /// Create a new current revision copying revision (or tag) `revision_id`
    pub async fn rollback_api_deployment(
        &self,
        name: &str,
        revision_id: &str,
    ) -> Result<ApiDeployment> {
        if revision_id.is_empty() {
            return Err(RegistryError::invalid_argument(
                "invalid revision_id \"\": must not be empty",
            ));
        }
        let deployment = DeploymentName::parse(name)?;
        reject_wildcards(&deployment.to_string(), deployment.has_wildcard())?;

        let txn = self.begin().await?;
        let client = Client::new(&txn);
        let target = client
            .deployment_revision(&deployment.revision(revision_id))
            .await?;
        let latest = client
            .current_deployment(&deployment)
            .await?
            .map_or(target.revision_create_time, |current| current.revision_create_time);

        let new_id =
            fresh_revision_id::<DeploymentEntity, DeploymentRevisionTagEntity, _, _>(&client, |id| {
                deployment.revision(id).to_string()
            })
            .await?;
        let time = storage::revision_time_after(latest);
        let row = deployment_row::Model {
            key: deployment.revision(&new_id).to_string(),
            revision_id: new_id,
            revision_create_time: time,
            revision_update_time: time,
            ..target
        };
        client.insert(row.clone().into_active()).await?;
        txn.commit().await?;

        info!(
            resource = %deployment,
            revision_id = %row.revision_id,
            target = revision_id,
            operation = "rollback_api_deployment",
            "Rolled back deployment"
        );
        self.notify(ChangeType::Created, &row.key).await;
        Ok(ApiDeployment::from_row(&row, row.key.clone(), Vec::new()))
    }

    /// Delete one revision (by id or tag) and return the deployment's current revision
    pub async fn delete_api_deployment_revision(&self, name: &str) -> Result<ApiDeployment> {
        let name = DeploymentRevisionName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;
        if !name.has_revision() {
            return Err(RegistryError::invalid_argument(format!(
                "invalid name {:?}: must name a revision",
                name.to_string()
            )));
        }

        let txn = self.begin().await?;
        let client = Client::new(&txn);
        let deleted = client.delete_deployment_revision(&name).await?;
        let deployment = name.deployment();
        let current = client
            .deployment_revision(&deployment.clone().into())
            .await?;
        let tags = client.deployment_revision_tags(&current).await?;
        txn.commit().await?;

        let deleted = deployment.revision(deleted).to_string();
        info!(
            resource = %deleted,
            operation = "delete_api_deployment_revision",
            "Deleted deployment revision"
        );
        self.notify(ChangeType::Deleted, &deleted).await;
        Ok(ApiDeployment::from_row(&current, deployment.to_string(), tags))
    }
}

async fn create_in<C: ConnectionTrait>(
    client: &Client<'_, C>,
    name: &DeploymentName,
    body: &ApiDeployment,
) -> Result<ApiDeployment> {
    require::<ApiEntity, C>(client, &name.api().to_string()).await?;
    if client.current_deployment(name).await?.is_some() {
        return Err(RegistryError::already_exists(format!(
            "{:?} already exists",
            name.to_string()
        )));
    }
    let revision_id = storage::new_revision_id();
    let now = storage::now();
    let row = body.to_row(name, &revision_id, now, now, now);
    client.insert(row.clone().into_active()).await?;
    Ok(ApiDeployment::from_row(&row, name.to_string(), Vec::new()))
}

async fn update_in<C: ConnectionTrait>(
    client: &Client<'_, C>,
    name: &DeploymentName,
    current: deployment_row::Model,
    body: &ApiDeployment,
    mask: Option<&FieldMask>,
) -> Result<ApiDeployment> {
    let mut deployment = ApiDeployment::from_row(&current, name.to_string(), Vec::new());
    FieldMask::apply(mask, &mut deployment, body)?;
    check_api_spec_revision(&deployment)?;

    if deployment.api_spec_revision == current.api_spec_revision {
        let row = deployment.to_row(
            name,
            &current.revision_id,
            current.create_time,
            current.revision_create_time,
            storage::revision_time_after(current.revision_update_time),
        );
        client.update(&current.key, row.clone().into_active()).await?;
        let tags = client.deployment_revision_tags(&row).await?;
        return Ok(ApiDeployment::from_row(&row, name.to_string(), tags));
    }

    let revision_id =
        fresh_revision_id::<DeploymentEntity, DeploymentRevisionTagEntity, _, _>(client, |id| {
            name.revision(id).to_string()
        })
        .await?;
    let time = storage::revision_time_after(current.revision_create_time);
    let row = deployment.to_row(name, &revision_id, current.create_time, time, time);
    client.insert(row.clone().into_active()).await?;
    debug!(
        deployment = %name,
        previous = %current.revision_id,
        revision_id = %revision_id,
        "Served spec changed, created revision"
    );
    Ok(ApiDeployment::from_row(&row, name.to_string(), Vec::new()))
}

async fn messages<C: ConnectionTrait>(
    client: &Client<'_, C>,
    rows: Vec<deployment_row::Model>,
    revision_names: bool,
) -> Result<Vec<ApiDeployment>> {
    let mut deployments = Vec::with_capacity(rows.len());
    for row in rows {
        let tags = client.deployment_revision_tags(&row).await?;
        let name = if revision_names {
            row.key.clone()
        } else {
            DeploymentName::new(&row.project_id, &row.api_id, &row.deployment_id).to_string()
        };
        deployments.push(ApiDeployment::from_row(&row, name, tags));
    }
    Ok(deployments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_api_spec_revision() {
        let mut body = ApiDeployment::default();
        assert!(check_api_spec_revision(&body).is_ok());

        body.api_spec_revision =
            "projects/p/locations/global/apis/a/versions/v/specs/s@prod".to_string();
        assert!(check_api_spec_revision(&body).is_ok());

        body.api_spec_revision = "not a spec".to_string();
        let err = check_api_spec_revision(&body).expect_err("malformed pointer");
        assert_eq!(err.code(), crate::error::Code::InvalidArgument);
    }
}
