//! Project operations

use super::{reject_wildcards, Registry};
use crate::error::{RegistryError, Result};
use crate::mask::FieldMask;
use crate::models::{project, ListRequest, ListResponse, Project};
use crate::notify::ChangeType;
use crate::pagination::{Filterable, Page};
use crate::storage::entities::{project as project_row, ProjectEntity};
use crate::storage::{self, Client};
use crate::upsert::{retry_upsert, ResourceKind};
use registry_names::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait};
use tracing::info;

impl Registry {
    pub async fn create_project(&self, project_id: &str, body: &Project) -> Result<Project> {
        let name = ProjectName::new(project_id);
        name.validate()?;

        let txn = self.begin().await?;
        let created = create_in(&Client::new(&txn), &name, body).await?;
        txn.commit().await?;

        info!(resource = %name, operation = "create_project", "Created project");
        self.notify(ChangeType::Created, &created.name).await;
        Ok(created)
    }

    pub async fn get_project(&self, name: &str) -> Result<Project> {
        let name = ProjectName::parse(name)?;
        reject_wildcards(&name.to_string(), name.is_wildcard())?;
        let row = Client::new(&self.db)
            .get::<ProjectEntity>(&name.to_string(), &name.to_string())
            .await?;
        Ok(Project::from_row(&row))
    }

    /// List projects; the request's `parent` is ignored
    pub async fn list_projects(&self, request: &ListRequest) -> Result<ListResponse<Project>> {
        let page = Page::new(request, project_row::Model::FIELDS, project::DEFAULT_ORDER)?;
        let (rows, next_page_token) = page.scan(&self.db, ProjectEntity::find()).await?;
        Ok(ListResponse {
            items: rows.iter().map(Project::from_row).collect(),
            next_page_token,
        })
    }

    /// Update the project named by `body.name`
    ///
    /// With `allow_missing`, a project that does not exist is created instead.
    pub async fn update_project(
        &self,
        body: &Project,
        mask: Option<&FieldMask>,
        allow_missing: bool,
    ) -> Result<Project> {
        let name = &ProjectName::parse(&body.name)?;
        reject_wildcards(&body.name, name.is_wildcard())?;

        let (project, change) = if allow_missing {
            let _guard = self.locks.lock(ResourceKind::Project).await;
            retry_upsert(&body.name, || self.save_project(name, body, mask, true)).await?
        } else {
            self.save_project(name, body, mask, false).await?
        };

        info!(resource = %name, operation = "update_project", change = %change, "Saved project");
        self.notify(change, &project.name).await;
        Ok(project)
    }

    async fn save_project(
        &self,
        name: &ProjectName,
        body: &Project,
        mask: Option<&FieldMask>,
        allow_missing: bool,
    ) -> Result<(Project, ChangeType)> {
        let txn = self.begin().await?;
        let client = Client::new(&txn);
        let key = name.to_string();

        let saved = match client.find::<ProjectEntity>(&key).await? {
            Some(row) => {
                let mut project = Project::from_row(&row);
                FieldMask::apply(mask, &mut project, body)?;
                let updated = project.to_row(name, row.create_time, storage::now());
                client.update(&key, updated.clone().into_active()).await?;
                (Project::from_row(&updated), ChangeType::Updated)
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

    /// Delete a project; with `force`, everything under it goes too
    pub async fn delete_project(&self, name: &str, force: bool) -> Result<()> {
        let name = ProjectName::parse(name)?;
        reject_wildcards(&name.to_string(), name.is_wildcard())?;

        let txn = self.begin().await?;
        Client::new(&txn).delete_project(&name, force).await?;
        txn.commit().await?;

        info!(resource = %name, operation = "delete_project", force = force, "Deleted project");
        self.notify(ChangeType::Deleted, &name.to_string()).await;
        Ok(())
    }
}

async fn create_in<C: ConnectionTrait>(
    client: &Client<'_, C>,
    name: &ProjectName,
    body: &Project,
) -> Result<Project> {
    let key = name.to_string();
    if client.exists::<ProjectEntity>(&key).await? {
        return Err(RegistryError::already_exists(format!("{key:?} already exists")));
    }
    let now = storage::now();
    let row = body.to_row(name, now, now);
    client.insert(row.clone().into_active()).await?;
    Ok(Project::from_row(&row))
}
