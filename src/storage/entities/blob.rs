//! Content blob entity
//!
//! Table: blobs
//! - key: name of the owning spec revision or artifact
//!
//! Blobs carry the owner's id columns so cascading deletes can remove them by
//! scope without parsing keys.

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "blobs")]
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
    pub hash: String,
    pub size_bytes: i64,
    #[serde(skip)]
    pub contents: Vec<u8>,
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
            hash: Set(self.hash),
            size_bytes: Set(self.size_bytes),
            contents: Set(self.contents),
            create_time: Set(self.create_time),
            update_time: Set(self.update_time),
        }
    }
}
