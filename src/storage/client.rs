//! Storage client
//!
//! A thin handle over any [`ConnectionTrait`] implementation. Registry
//! operations open a transaction, wrap it in a [`Client`] and run every read
//! and write of one logical change through it.

use super::entities::{
    api, artifact, blob, deployment, deployment_revision_tag, spec, spec_revision_tag, version,
    ApiEntity, ArtifactEntity, BlobEntity, DeploymentEntity, DeploymentRevisionTagEntity,
    ProjectEntity, SpecEntity, SpecRevisionTagEntity, VersionEntity,
};
use super::scope::key_is;
use crate::error::{RegistryError, Result};
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{
    ActiveModelTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, Schema,
};
use std::fmt;
use tracing::{debug, info};

pub struct Client<'a, C> {
    conn: &'a C,
}

impl<C> fmt::Debug for Client<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl<'a, C: ConnectionTrait> Client<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &'a C {
        self.conn
    }

    /// Row stored under `key`, if any
    pub async fn find<E: EntityTrait>(&self, key: &str) -> Result<Option<E::Model>> {
        Ok(E::find().filter(key_is(key)).one(self.conn).await?)
    }

    /// Row stored under `key`, or `NotFound` naming `name`
    pub async fn get<E: EntityTrait>(&self, key: &str, name: &str) -> Result<E::Model> {
        self.find::<E>(key)
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("{name:?} not found")))
    }

    pub async fn exists<E: EntityTrait>(&self, key: &str) -> Result<bool>
    where
        E::Model: Sync,
    {
        Ok(self.count::<E>(Condition::all().add(key_is(key))).await? > 0)
    }

    pub async fn count<E: EntityTrait>(&self, cond: Condition) -> Result<u64>
    where
        E::Model: Sync,
    {
        Ok(E::find().filter(cond).count(self.conn).await?)
    }

    /// Rows matching `cond`, in storage key order
    pub async fn all<E: EntityTrait>(&self, cond: Condition) -> Result<Vec<E::Model>> {
        Ok(E::find().filter(cond).all(self.conn).await?)
    }

    /// Insert a new row; a duplicate key is `AlreadyExists`
    pub async fn insert<A>(&self, row: A) -> Result<()>
    where
        A: ActiveModelTrait + Send,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        <A::Entity as EntityTrait>::insert(row)
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }

    /// Overwrite the row stored under `key`, returning whether it existed
    pub async fn update<A>(&self, key: &str, row: A) -> Result<bool>
    where
        A: ActiveModelTrait + Send,
    {
        let result = <A::Entity as EntityTrait>::update_many()
            .set(row)
            .filter(key_is(key))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Delete every row matching `cond`, returning how many were removed
    pub async fn purge<E: EntityTrait>(&self, cond: Condition) -> Result<u64> {
        let result = E::delete_many().filter(cond).exec(self.conn).await?;
        if result.rows_affected > 0 {
            debug!(
                table = %E::default().table_name(),
                rows = result.rows_affected,
                "Purged rows"
            );
        }
        Ok(result.rows_affected)
    }

    /// Create every registry table and index that does not exist yet
    pub async fn migrate(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);

        let mut tables = vec![
            schema.create_table_from_entity(ProjectEntity),
            schema.create_table_from_entity(ApiEntity),
            schema.create_table_from_entity(VersionEntity),
            schema.create_table_from_entity(SpecEntity),
            schema.create_table_from_entity(SpecRevisionTagEntity),
            schema.create_table_from_entity(DeploymentEntity),
            schema.create_table_from_entity(DeploymentRevisionTagEntity),
            schema.create_table_from_entity(ArtifactEntity),
            schema.create_table_from_entity(BlobEntity),
        ];
        for table in &mut tables {
            table.if_not_exists();
            self.conn.execute(backend.build(&*table)).await?;
        }

        for index in indexes() {
            self.conn.execute(backend.build(&index)).await?;
        }

        info!(backend = ?backend, "Registry schema is up to date");
        Ok(())
    }
}

/// Secondary indexes on the id columns used for scoping and revision lookup
fn indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_apis_scope")
            .table(ApiEntity)
            .col(api::Column::ProjectId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_versions_scope")
            .table(VersionEntity)
            .col(version::Column::ProjectId)
            .col(version::Column::ApiId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_specs_revisions")
            .table(SpecEntity)
            .col(spec::Column::ProjectId)
            .col(spec::Column::ApiId)
            .col(spec::Column::VersionId)
            .col(spec::Column::SpecId)
            .col(spec::Column::RevisionCreateTime)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_spec_revision_tags_scope")
            .table(SpecRevisionTagEntity)
            .col(spec_revision_tag::Column::ProjectId)
            .col(spec_revision_tag::Column::ApiId)
            .col(spec_revision_tag::Column::VersionId)
            .col(spec_revision_tag::Column::SpecId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_deployments_revisions")
            .table(DeploymentEntity)
            .col(deployment::Column::ProjectId)
            .col(deployment::Column::ApiId)
            .col(deployment::Column::DeploymentId)
            .col(deployment::Column::RevisionCreateTime)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_deployment_revision_tags_scope")
            .table(DeploymentRevisionTagEntity)
            .col(deployment_revision_tag::Column::ProjectId)
            .col(deployment_revision_tag::Column::ApiId)
            .col(deployment_revision_tag::Column::DeploymentId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_artifacts_scope")
            .table(ArtifactEntity)
            .col(artifact::Column::ProjectId)
            .col(artifact::Column::ApiId)
            .col(artifact::Column::VersionId)
            .col(artifact::Column::SpecId)
            .col(artifact::Column::DeploymentId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_blobs_scope")
            .table(BlobEntity)
            .col(blob::Column::ProjectId)
            .col(blob::Column::ApiId)
            .if_not_exists()
            .to_owned(),
    ]
}
