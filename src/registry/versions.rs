//! Version operations

use super::{reject_wildcards, require, require_list_parent, Registry};
use crate::error::{RegistryError, Result};
use crate::mask::FieldMask;
use crate::models::{version, ListRequest, ListResponse, Version};
use crate::notify::ChangeType;
use crate::pagination::{Filterable, Page};
use crate::storage::entities::{version as version_row, ApiEntity, VersionEntity};
use crate::storage::{self, Client, Scope};
use crate::upsert::{retry_upsert, ResourceKind};
use registry_names::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter};
use tracing::info;

/// A primary spec, when set, must name a spec (optionally at a revision)
fn check_primary_spec(body: &Version) -> Result<()> {
    if !body.primary_spec.is_empty() {
        SpecRevisionName::parse(&body.primary_spec).map_err(|e| {
            RegistryError::invalid_argument(format!(
                "invalid primary_spec {:?}: {e}",
                body.primary_spec
            ))
        })?;
    }
    Ok(())
}

impl Registry {
    /// Create a version under the api `parent`
    pub async fn create_api_version(
        &self,
        parent: &str,
        version_id: &str,
        body: &Version,
    ) -> Result<Version> {
        let name = ApiName::parse(parent)?.version(version_id);
        name.validate()?;
        check_primary_spec(body)?;

        let txn = self.begin().await?;
        let created = create_in(&Client::new(&txn), &name, body).await?;
        txn.commit().await?;

        info!(resource = %name, operation = "create_api_version", "Created version");
        self.notify(ChangeType::Created, &created.name).await;
        Ok(created)
    }

    pub async fn get_api_version(&self, name: &str) -> Result<Version> {
        let name = VersionName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;
        let key = name.to_string();
        let row = Client::new(&self.db).get::<VersionEntity>(&key, &key).await?;
        Ok(Version::from_row(&row))
    }

    /// List versions under an api; any parent segment may be `-`
    pub async fn list_api_versions(&self, request: &ListRequest) -> Result<ListResponse<Version>> {
        let parent = ApiName::parse(&request.parent)?;
        let page = Page::new(request, version_row::Model::FIELDS, version::DEFAULT_ORDER)?;
        let scope = Scope::api(&parent);
        require_list_parent(&Client::new(&self.db), &scope).await?;

        let query = VersionEntity::find().filter(scope.condition());
        let (rows, next_page_token) = page.scan(&self.db, query).await?;
        Ok(ListResponse {
            items: rows.iter().map(Version::from_row).collect(),
            next_page_token,
        })
    }

    /// Update the version named by `body.name`
    ///
    /// With `allow_missing`, a version that does not exist is created instead.
    pub async fn update_api_version(
        &self,
        body: &Version,
        mask: Option<&FieldMask>,
        allow_missing: bool,
    ) -> Result<Version> {
        let name = &VersionName::parse(&body.name)?;
        reject_wildcards(&body.name, name.has_wildcard())?;

        let (version, change) = if allow_missing {
            let _guard = self.locks.lock(ResourceKind::Version).await;
            retry_upsert(&body.name, || self.save_api_version(name, body, mask, true)).await?
        } else {
            self.save_api_version(name, body, mask, false).await?
        };

        info!(resource = %name, operation = "update_api_version", change = %change, "Saved version");
        self.notify(change, &version.name).await;
        Ok(version)
    }

    async fn save_api_version(
        &self,
        name: &VersionName,
        body: &Version,
        mask: Option<&FieldMask>,
        allow_missing: bool,
    ) -> Result<(Version, ChangeType)> {
        let txn = self.begin().await?;
        let client = Client::new(&txn);
        let key = name.to_string();

        let saved = match client.find::<VersionEntity>(&key).await? {
            Some(row) => {
                let mut version = Version::from_row(&row);
                FieldMask::apply(mask, &mut version, body)?;
                check_primary_spec(&version)?;
                let updated = version.to_row(name, row.create_time, storage::now());
                client.update(&key, updated.clone().into_active()).await?;
                (Version::from_row(&updated), ChangeType::Updated)
            }
            None if allow_missing => {
                name.validate()?;
                check_primary_spec(body)?;
                (create_in(&client, name, body).await?, ChangeType::Created)
            }
            None => return Err(RegistryError::not_found(format!("{key:?} not found"))),
        };

        txn.commit().await?;
        Ok(saved)
    }

    /// Delete a version; with `force`, its specs and artifacts go too
    pub async fn delete_api_version(&self, name: &str, force: bool) -> Result<()> {
        let name = VersionName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;

        let txn = self.begin().await?;
        Client::new(&txn).delete_version(&name, force).await?;
        txn.commit().await?;

        info!(resource = %name, operation = "delete_api_version", force = force, "Deleted version");
        self.notify(ChangeType::Deleted, &name.to_string()).await;
        Ok(())
    }
}

async fn create_in<C: ConnectionTrait>(
    client: &Client<'_, C>,
    name: &VersionName,
    body: &Version,
) -> Result<Version> {
    require::<ApiEntity, C>(client, &name.api().to_string()).await?;
    let key = name.to_string();
    if client.exists::<VersionEntity>(&key).await? {
        return Err(RegistryError::already_exists(format!("{key:?} already exists")));
    }
    let now = storage::now();
    let row = body.to_row(name, now, now);
    client.insert(row.clone().into_active()).await?;
    Ok(Version::from_row(&row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_primary_spec() {
        let mut body = Version::default();
        assert!(check_primary_spec(&body).is_ok(), "unset primary spec is fine");

        body.primary_spec = "projects/p/locations/global/apis/a/versions/v/specs/s@1234abcd".to_string();
        assert!(check_primary_spec(&body).is_ok());

        body.primary_spec = "specs/s".to_string();
        assert!(check_primary_spec(&body).is_err());
    }
}
