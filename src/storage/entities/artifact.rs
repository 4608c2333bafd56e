//! Artifact entity
//!
//! Table: artifacts
//! - key: "{parent}/artifacts/{artifact}", where a spec or deployment parent
//!   always carries a concrete revision id
//!
//! Ids that do not apply to the parent kind are stored as empty strings, so
//! "direct children of X" is an equality match on every id column.

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "artifacts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub project_id: String,
    pub api_id: String,
    pub version_id: String,
    pub spec_id: String,
    pub deployment_id: String,
    pub revision_id: String,
    pub artifact_id: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub hash: String,
    #[sea_orm(column_type = "Json")]
    pub labels: serde_json::Value,
    #[sea_orm(column_type = "Json")]
    pub annotations: serde_json::Value,
    pub create_time: DateTimeUtc,
    pub update_time: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_active(self) -> ActiveModel {
        ActiveModel {
            key: Set(self.key),
            project_id: Set(self.project_id),
            api_id: Set(self.api_id),
            version_id: Set(self.version_id),
            spec_id: Set(self.spec_id),
            deployment_id: Set(self.deployment_id),
            revision_id: Set(self.revision_id),
            artifact_id: Set(self.artifact_id),
            mime_type: Set(self.mime_type),
            size_bytes: Set(self.size_bytes),
            hash: Set(self.hash),
            labels: Set(self.labels),
            annotations: Set(self.annotations),
            create_time: Set(self.create_time),
            update_time: Set(self.update_time),
        }
    }
}
