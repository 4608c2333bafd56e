//! Api operations

use super::{reject_wildcards, require, require_list_parent, Registry};
use crate::error::{RegistryError, Result};
use crate::mask::FieldMask;
use crate::models::{api, Api, ListRequest, ListResponse};
use crate::notify::ChangeType;
use crate::pagination::{Filterable, Page};
use crate::storage::entities::{api as api_row, ApiEntity, ProjectEntity};
use crate::storage::{self, Client, Scope};
use crate::upsert::{retry_upsert, ResourceKind};
use registry_names::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter};
use tracing::info;

impl Registry {
    /// Create an api under `parent` (`projects/{p}/locations/global`)
    pub async fn create_api(&self, parent: &str, api_id: &str, body: &Api) -> Result<Api> {
        let name = ProjectName::parse(parent)?.api(api_id);
        name.validate()?;

        let txn = self.begin().await?;
        let created = create_in(&Client::new(&txn), &name, body).await?;
        txn.commit().await?;

        info!(resource = %name, operation = "create_api", "Created api");
        self.notify(ChangeType::Created, &created.name).await;
        Ok(created)
    }

    pub async fn get_api(&self, name: &str) -> Result<Api> {
        let name = ApiName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;
        let key = name.to_string();
        let row = Client::new(&self.db).get::<ApiEntity>(&key, &key).await?;
        Ok(Api::from_row(&row))
    }

    /// List apis under a project; the project id may be `-`
    pub async fn list_apis(&self, request: &ListRequest) -> Result<ListResponse<Api>> {
        let parent = ProjectName::parse(&request.parent)?;
        let page = Page::new(request, api_row::Model::FIELDS, api::DEFAULT_ORDER)?;
        let scope = Scope::project(&parent);
        require_list_parent(&Client::new(&self.db), &scope).await?;

        let query = ApiEntity::find().filter(scope.condition());
        let (rows, next_page_token) = page.scan(&self.db, query).await?;
        Ok(ListResponse {
            items: rows.iter().map(Api::from_row).collect(),
            next_page_token,
        })
    }

    /// Update the api named by `body.name`
    ///
    /// With `allow_missing`, an api that does not exist is created instead.
    pub async fn update_api(
        &self,
        body: &Api,
        mask: Option<&FieldMask>,
        allow_missing: bool,
    ) -> Result<Api> {
        let name = &ApiName::parse(&body.name)?;
        reject_wildcards(&body.name, name.has_wildcard())?;

        let (api, change) = if allow_missing {
            let _guard = self.locks.lock(ResourceKind::Api).await;
            retry_upsert(&body.name, || self.save_api(name, body, mask, true)).await?
        } else {
            self.save_api(name, body, mask, false).await?
        };

        info!(resource = %name, operation = "update_api", change = %change, "Saved api");
        self.notify(change, &api.name).await;
        Ok(api)
    }

    async fn save_api(
        &self,
        name: &ApiName,
        body: &Api,
        mask: Option<&FieldMask>,
        allow_missing: bool,
    ) -> Result<(Api, ChangeType)> {
        let txn = self.begin().await?;
        let client = Client::new(&txn);
        let key = name.to_string();

        let saved = match client.find::<ApiEntity>(&key).await? {
            Some(row) => {
                let mut api = Api::from_row(&row);
                FieldMask::apply(mask, &mut api, body)?;
                let updated = api.to_row(name, row.create_time, storage::now());
                client.update(&key, updated.clone().into_active()).await?;
                (Api::from_row(&updated), ChangeType::Updated)
            }
            None if allow_missing => {
                name.validate()?;
                (create_in(&client, name, body).await?, ChangeType::Created)
            }
            None => return Err(RegistryError::not_found(format!("{key:?} not found"))),
        };

        txn.commit().await?;
        Ok(saved)
    }

    /// Delete an api; with `force`, its versions, specs, deployments and artifacts go too
    pub async fn delete_api(&self, name: &str, force: bool) -> Result<()> {
        let name = ApiName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;

        let txn = self.begin().await?;
        Client::new(&txn).delete_api(&name, force).await?;
        txn.commit().await?;

        info!(resource = %name, operation = "delete_api", force = force, "Deleted api");
        self.notify(ChangeType::Deleted, &name.to_string()).await;
        Ok(())
    }
}

async fn create_in<C: ConnectionTrait>(
    client: &Client<'_, C>,
    name: &ApiName,
    body: &Api,
) -> Result<Api> {
    require::<ProjectEntity, C>(client, &name.project().to_string()).await?;
    let key = name.to_string();
    if client.exists::<ApiEntity>(&key).await? {
        return Err(RegistryError::already_exists(format!("{key:?} already exists")));
    }
    let now = storage::now();
    let row = body.to_row(name, now, now);
    client.insert(row.clone().into_active()).await?;
    Ok(Api::from_row(&row))
}
