//! Deployment revision entity
//!
//! Table: deployments (one row per revision)
//! - key: ".../apis/{api}/deployments/{deployment}@{revision}"

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "deployments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub project_id: String,
    pub api_id: String,
    pub deployment_id: String,
    pub revision_id: String,
    pub display_name: String,
    pub description: String,
    pub api_spec_revision: String,
    pub endpoint_uri: String,
    pub external_channel_uri: String,
    pub intended_audience: String,
    pub access_guidance: String,
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
            deployment_id: Set(self.deployment_id),
            revision_id: Set(self.revision_id),
            display_name: Set(self.display_name),
            description: Set(self.description),
            api_spec_revision: Set(self.api_spec_revision),
            endpoint_uri: Set(self.endpoint_uri),
            external_channel_uri: Set(self.external_channel_uri),
            intended_audience: Set(self.intended_audience),
            access_guidance: Set(self.access_guidance),
            labels: Set(self.labels),
            annotations: Set(self.annotations),
            create_time: Set(self.create_time),
            revision_create_time: Set(self.revision_create_time),
            revision_update_time: Set(self.revision_update_time),
        }
    }
}
