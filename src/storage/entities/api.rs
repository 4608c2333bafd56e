//! Api entity
//!
//! Table: apis
//! - key: "projects/{project}/locations/global/apis/{api}"

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "apis")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub project_id: String,
    pub api_id: String,
    pub display_name: String,
    pub description: String,
    pub availability: String,
    pub recommended_version: String,
    pub recommended_deployment: String,
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
            display_name: Set(self.display_name),
            description: Set(self.description),
            availability: Set(self.availability),
            recommended_version: Set(self.recommended_version),
            recommended_deployment: Set(self.recommended_deployment),
            labels: Set(self.labels),
            annotations: Set(self.annotations),
            create_time: Set(self.create_time),
            update_time: Set(self.update_time),
        }
    }
}
