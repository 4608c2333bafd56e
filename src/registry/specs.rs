//! Spec operations
//!
//! Specs are revisioned. An update whose `contents` hash differs from the
//! current revision's creates a new revision; any other update rewrites the
//! current revision in place and only advances `revision_update_time`.
//! Tags and rollback work on concrete revisions.

use super::{fresh_revision_id, reject_wildcards, require, require_list_parent, Registry};
use crate::error::{RegistryError, Result};
use crate::mask::FieldMask;
use crate::models::{
    check_compression, content_hash, content_size, spec, ApiSpec, Contents, ListRequest,
    ListResponse,
};
use crate::notify::ChangeType;
use crate::pagination::{Filterable, OrderBy, Page};
use crate::storage::blobs::spec_blob;
use crate::storage::entities::{
    spec as spec_row, SpecEntity, SpecRevisionTagEntity, VersionEntity,
};
use crate::storage::scope::current_spec_revision;
use crate::storage::{self, Client, Scope};
use crate::upsert::{retry_upsert, ResourceKind};
use registry_names::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter};
use tracing::{debug, info};

/// Revision listings default to newest first
const REVISION_ORDER: &[OrderBy] = &[OrderBy::desc("revision_create_time")];

impl Registry {
    /// Create a spec under the version `parent` with its first revision
    pub async fn create_api_spec(
        &self,
        parent: &str,
        spec_id: &str,
        body: &ApiSpec,
    ) -> Result<ApiSpec> {
        let name = VersionName::parse(parent)?.spec(spec_id);
        name.validate()?;

        let txn = self.begin().await?;
        let created = create_in(&Client::new(&txn), &name, body).await?;
        txn.commit().await?;

        info!(
            resource = %name,
            revision_id = %created.revision_id,
            operation = "create_api_spec",
            "Created spec"
        );
        self.notify(ChangeType::Created, &created.name).await;
        Ok(created)
    }

    /// Get the current revision, or the revision named by `name@revision` or `name@tag`
    pub async fn get_api_spec(&self, name: &str) -> Result<ApiSpec> {
        let name = SpecRevisionName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;

        let client = Client::new(&self.db);
        let row = client.spec_revision(&name).await?;
        let tags = client.spec_revision_tags(&row).await?;
        Ok(ApiSpec::from_row(&row, name.to_string(), tags))
    }

    /// Raw contents of a spec revision, exactly as stored
    pub async fn get_api_spec_contents(&self, name: &str) -> Result<Contents> {
        let name = SpecRevisionName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;

        let client = Client::new(&self.db);
        let row = client.spec_revision(&name).await?;
        let blob = client.get_blob(&row.key, &name.to_string()).await?;
        Ok(Contents {
            mime_type: row.mime_type,
            data: blob.contents,
        })
    }

    /// List the current revision of every spec under a version; any parent segment may be `-`
    pub async fn list_api_specs(&self, request: &ListRequest) -> Result<ListResponse<ApiSpec>> {
        let parent = VersionName::parse(&request.parent)?;
        let page = Page::new(request, spec_row::Model::FIELDS, spec::DEFAULT_ORDER)?;
        let scope = Scope::version(&parent);
        let client = Client::new(&self.db);
        require_list_parent(&client, &scope).await?;

        let query = SpecEntity::find()
            .filter(scope.condition())
            .filter(current_spec_revision());
        let (rows, next_page_token) = page.scan(&self.db, query).await?;
        Ok(ListResponse {
            items: messages(&client, rows, false).await?,
            next_page_token,
        })
    }

    /// List revisions of a spec, newest first
    ///
    /// `request.parent` names the spec, optionally as `spec@-`; any segment
    /// may be `-` to list revisions of several specs.
    pub async fn list_api_spec_revisions(
        &self,
        request: &ListRequest,
    ) -> Result<ListResponse<ApiSpec>> {
        let parent = SpecRevisionName::parse(&request.parent)?.spec();
        let page = Page::new(request, spec_row::Model::FIELDS, REVISION_ORDER)?;
        let scope = Scope::spec(&parent);
        let client = Client::new(&self.db);
        require_list_parent(&client, &scope).await?;

        let query = SpecEntity::find().filter(scope.condition());
        let (rows, next_page_token) = page.scan(&self.db, query).await?;
        Ok(ListResponse {
            items: messages(&client, rows, true).await?,
            next_page_token,
        })
    }

    /// Update the spec named by `body.name`
    ///
    /// `body.name` must not carry a revision. With `allow_missing`, a spec that
    /// does not exist is created instead.
    pub async fn update_api_spec(
        &self,
        body: &ApiSpec,
        mask: Option<&FieldMask>,
        allow_missing: bool,
    ) -> Result<ApiSpec> {
        let name = &SpecName::parse(&body.name)?;
        reject_wildcards(&body.name, name.has_wildcard())?;

        let (spec, change) = if allow_missing {
            let _guard = self.locks.lock(ResourceKind::Spec).await;
            retry_upsert(&body.name, || self.save_api_spec(name, body, mask, true)).await?
        } else {
            self.save_api_spec(name, body, mask, false).await?
        };

        info!(
            resource = %name,
            revision_id = %spec.revision_id,
            operation = "update_api_spec",
            change = %change,
            "Saved spec"
        );
        self.notify(change, &spec.name).await;
        Ok(spec)
    }

    async fn save_api_spec(
        &self,
        name: &SpecName,
        body: &ApiSpec,
        mask: Option<&FieldMask>,
        allow_missing: bool,
    ) -> Result<(ApiSpec, ChangeType)> {
        let txn = self.begin().await?;
        let client = Client::new(&txn);

        let saved = match client.current_spec(name).await? {
            Some(current) => (
                update_in(&client, name, current, body, mask).await?,
                ChangeType::Updated,
            ),
            None if allow_missing => {
                name.validate()?;
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

    /// Delete a spec and all of its revisions; with `force`, its artifacts go too
    pub async fn delete_api_spec(&self, name: &str, force: bool) -> Result<()> {
        let name = SpecName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;

        let txn = self.begin().await?;
        Client::new(&txn).delete_spec(&name, force).await?;
        txn.commit().await?;

        info!(resource = %name, operation = "delete_api_spec", force = force, "Deleted spec");
        self.notify(ChangeType::Deleted, &name.to_string()).await;
        Ok(())
    }

    /// Point `tag` at the revision named by `name`, moving the tag if it exists
    ///
    /// Returns the tagged revision under its `name@tag` spelling.
    pub async fn tag_api_spec_revision(&self, name: &str, tag: &str) -> Result<ApiSpec> {
        validate_revision_tag(tag)?;
        let name = SpecRevisionName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;

        let txn = self.begin().await?;
        let client = Client::new(&txn);
        let revision = client.spec_revision(&name).await?;
        client
            .put_spec_revision_tag(&revision, tag, storage::now())
            .await?;
        let tags = client.spec_revision_tags(&revision).await?;
        txn.commit().await?;

        info!(
            resource = %revision.key,
            tag = tag,
            operation = "tag_api_spec_revision",
            "Tagged spec revision"
        );
        self.notify(ChangeType::Updated, &revision.key).await;
        let tagged = name.spec().tag(tag).revision_name();
        Ok(ApiSpec::from_row(&revision, tagged, tags))
    }

    /// Create a new current revision with the contents of revision `revision_id`
    ///
    /// The new revision always gets a fresh id; `revision_id` may also be a tag.
    pub async fn rollback_api_spec(&self, name: &str, revision_id: &str) -> Result<ApiSpec> {
        if revision_id.is_empty() {
            return Err(RegistryError::invalid_argument(
                "invalid revision_id \"\": must not be empty",
            ));
        }
        let spec = SpecName::parse(name)?;
        reject_wildcards(&spec.to_string(), spec.has_wildcard())?;

        let txn = self.begin().await?;
        let client = Client::new(&txn);
        let target = client.spec_revision(&spec.revision(revision_id)).await?;
        let blob = client.get_blob(&target.key, &target.key).await?;
        let latest = client
            .current_spec(&spec)
            .await?
            .map_or(target.revision_create_time, |current| current.revision_create_time);

        let new_id = fresh_revision_id::<SpecEntity, SpecRevisionTagEntity, _, _>(&client, |id| {
            spec.revision(id).to_string()
        })
        .await?;
        let time = storage::revision_time_after(latest);
        let row = spec_row::Model {
            key: spec.revision(&new_id).to_string(),
            revision_id: new_id,
            revision_create_time: time,
            revision_update_time: time,
            ..target
        };
        client.insert(row.clone().into_active()).await?;
        client.put_blob(spec_blob(&row, blob.contents, time)).await?;
        txn.commit().await?;

        info!(
            resource = %spec,
            revision_id = %row.revision_id,
            target = revision_id,
            operation = "rollback_api_spec",
            "Rolled back spec"
        );
        self.notify(ChangeType::Created, &row.key).await;
        Ok(ApiSpec::from_row(&row, row.key.clone(), Vec::new()))
    }

    /// Delete one revision (by id or tag) and return the spec's current revision
    ///
    /// The only remaining revision of a spec cannot be deleted.
    pub async fn delete_api_spec_revision(&self, name: &str) -> Result<ApiSpec> {
        let name = SpecRevisionName::parse(name)?;
        reject_wildcards(&name.to_string(), name.has_wildcard())?;
        if !name.has_revision() {
            return Err(RegistryError::invalid_argument(format!(
                "invalid name {:?}: must name a revision",
                name.to_string()
            )));
        }

        let txn = self.begin().await?;
        let client = Client::new(&txn);
        let deleted = client.delete_spec_revision(&name).await?;
        let spec = name.spec();
        let current = client.spec_revision(&spec.clone().into()).await?;
        let tags = client.spec_revision_tags(&current).await?;
        txn.commit().await?;

        let deleted = spec.revision(deleted).to_string();
        info!(resource = %deleted, operation = "delete_api_spec_revision", "Deleted spec revision");
        self.notify(ChangeType::Deleted, &deleted).await;
        Ok(ApiSpec::from_row(&current, spec.to_string(), tags))
    }
}

async fn create_in<C: ConnectionTrait>(
    client: &Client<'_, C>,
    name: &SpecName,
    body: &ApiSpec,
) -> Result<ApiSpec> {
    require::<VersionEntity, C>(client, &name.version().to_string()).await?;
    if client.current_spec(name).await?.is_some() {
        return Err(RegistryError::already_exists(format!(
            "{:?} already exists",
            name.to_string()
        )));
    }
    check_compression(&body.mime_type, &body.contents)?;

    let mut spec = body.clone();
    spec.size_bytes = content_size(&spec.contents);
    spec.hash = content_hash(&spec.contents);
    let revision_id = storage::new_revision_id();
    let now = storage::now();
    let row = spec.to_row(name, &revision_id, now, now, now);
    client.insert(row.clone().into_active()).await?;
    client
        .put_blob(spec_blob(&row, std::mem::take(&mut spec.contents), now))
        .await?;
    Ok(ApiSpec::from_row(&row, name.to_string(), Vec::new()))
}

async fn update_in<C: ConnectionTrait>(
    client: &Client<'_, C>,
    name: &SpecName,
    current: spec_row::Model,
    body: &ApiSpec,
    mask: Option<&FieldMask>,
) -> Result<ApiSpec> {
    let mut spec = ApiSpec::from_row(&current, name.to_string(), Vec::new());
    let paths = FieldMask::apply(mask, &mut spec, body)?;

    if !paths.contains(&"contents") {
        if paths.contains(&"mime_type") && spec.mime_type != current.mime_type {
            let blob = client.get_blob(&current.key, &current.key).await?;
            check_compression(&spec.mime_type, &blob.contents)?;
        }
        return rewrite_current(client, name, &current, &spec).await;
    }

    check_compression(&spec.mime_type, &spec.contents)?;
    let contents = std::mem::take(&mut spec.contents);
    let hash = content_hash(&contents);
    if hash == current.hash {
        let saved = rewrite_current(client, name, &current, &spec).await?;
        let row = client.get::<SpecEntity>(&current.key, &current.key).await?;
        client
            .put_blob(spec_blob(&row, contents, row.revision_update_time))
            .await?;
        return Ok(saved);
    }

    let revision_id = fresh_revision_id::<SpecEntity, SpecRevisionTagEntity, _, _>(client, |id| {
        name.revision(id).to_string()
    })
    .await?;
    let time = storage::revision_time_after(current.revision_create_time);
    spec.size_bytes = content_size(&contents);
    spec.hash = hash;
    let row = spec.to_row(name, &revision_id, current.create_time, time, time);
    client.insert(row.clone().into_active()).await?;
    client.put_blob(spec_blob(&row, contents, time)).await?;
    debug!(
        spec = %name,
        previous = %current.revision_id,
        revision_id = %revision_id,
        "Contents changed, created revision"
    );
    Ok(ApiSpec::from_row(&row, name.to_string(), Vec::new()))
}

/// Save metadata changes into the current revision's row
async fn rewrite_current<C: ConnectionTrait>(
    client: &Client<'_, C>,
    name: &SpecName,
    current: &spec_row::Model,
    spec: &ApiSpec,
) -> Result<ApiSpec> {
    let mut spec = spec.clone();
    spec.size_bytes = current.size_bytes;
    spec.hash.clone_from(&current.hash);
    let row = spec.to_row(
        name,
        &current.revision_id,
        current.create_time,
        current.revision_create_time,
        storage::revision_time_after(current.revision_update_time),
    );
    client.update(&current.key, row.clone().into_active()).await?;
    let tags = client.spec_revision_tags(&row).await?;
    Ok(ApiSpec::from_row(&row, name.to_string(), tags))
}

/// Messages for listed rows, named `spec@revision` in revision listings
async fn messages<C: ConnectionTrait>(
    client: &Client<'_, C>,
    rows: Vec<spec_row::Model>,
    revision_names: bool,
) -> Result<Vec<ApiSpec>> {
    let mut specs = Vec::with_capacity(rows.len());
    for row in rows {
        let tags = client.spec_revision_tags(&row).await?;
        let name = if revision_names {
            row.key.clone()
        } else {
            SpecName::new(&row.project_id, &row.api_id, &row.version_id, &row.spec_id).to_string()
        };
        specs.push(ApiSpec::from_row(&row, name, tags));
    }
    Ok(specs)
}
