//! Deployment revision tag entity
//!
//! Table: deployment_revision_tags
//! - key: ".../deployments/{deployment}@{tag}"

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "deployment_revision_tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub project_id: String,
    pub api_id: String,
    pub deployment_id: String,
    pub revision_id: String,
    pub tag: String,
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
            deployment_id: Set(self.deployment_id),
            revision_id: Set(self.revision_id),
            tag: Set(self.tag),
            create_time: Set(self.create_time),
            update_time: Set(self.update_time),
        }
    }
}
