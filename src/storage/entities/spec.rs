//! Spec revision entity
//!
//! Table: specs (one row per revision)
//! - key: ".../versions/{version}/specs/{spec}@{revision}"
//!
//! The current revision of a spec is the row with the latest
//! `revision_create_time`.

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "specs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub project_id: String,
    pub api_id: String,
    pub version_id: String,
    pub spec_id: String,
    pub revision_id: String,
    pub filename: String,
    pub description: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub hash: String,
    pub source_uri: String,
    #[sea_orm(column_type = "Json")]
    pub labels: serde_json::Value,
    #[sea_orm(column_type = "Json")]
    pub annotations: serde_json::Value,
    pub create_time: DateTimeUtc,
    pub revision_create_time: DateTimeUtc,
    pub revision_update_time: DateTimeUtc,
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
            revision_id: Set(self.revision_id),
            filename: Set(self.filename),
            description: Set(self.description),
            mime_type: Set(self.mime_type),
            size_bytes: Set(self.size_bytes),
            hash: Set(self.hash),
            source_uri: Set(self.source_uri),
            labels: Set(self.labels),
            annotations: Set(self.annotations),
            create_time: Set(self.create_time),
            revision_create_time: Set(self.revision_create_time),
            revision_update_time: Set(self.revision_update_time),
        }
    }
}
