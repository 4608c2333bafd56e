//! Api messages

use super::{labels_from_json, labels_to_json, Labels};
use crate::filtering::{Field, FieldMap, FieldType, Value};
use crate::mask::Masked;
use crate::pagination::{Filterable, OrderBy};
use crate::storage::entities::api;
use chrono::{DateTime, Utc};
use registry_names::api::ApiName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Api {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub availability: String,
    pub recommended_version: String,
    pub recommended_deployment: String,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub annotations: Labels,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

impl Api {
    pub(crate) fn from_row(row: &api::Model) -> Self {
        Self {
            name: row.key.clone(),
            display_name: row.display_name.clone(),
            description: row.description.clone(),
            availability: row.availability.clone(),
            recommended_version: row.recommended_version.clone(),
            recommended_deployment: row.recommended_deployment.clone(),
            labels: labels_from_json(&row.labels),
            annotations: labels_from_json(&row.annotations),
            create_time: Some(row.create_time),
            update_time: Some(row.update_time),
        }
    }

    pub(crate) fn to_row(
        &self,
        name: &ApiName,
        create_time: DateTime<Utc>,
        update_time: DateTime<Utc>,
    ) -> api::Model {
        api::Model {
            key: name.to_string(),
            project_id: name.project_id.clone(),
            api_id: name.api_id.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            availability: self.availability.clone(),
            recommended_version: self.recommended_version.clone(),
            recommended_deployment: self.recommended_deployment.clone(),
            labels: labels_to_json(&self.labels),
            annotations: labels_to_json(&self.annotations),
            create_time,
            update_time,
        }
    }
}

impl Masked for Api {
    const MUTABLE: &'static [&'static str] = &[
        "display_name",
        "description",
        "availability",
        "recommended_version",
        "recommended_deployment",
        "labels",
        "annotations",
    ];
    const OUTPUT_ONLY: &'static [&'static str] = &["name", "create_time", "update_time"];

    fn is_populated(&self, path: &str) -> bool {
        match path {
            "display_name" => !self.display_name.is_empty(),
            "description" => !self.description.is_empty(),
            "availability" => !self.availability.is_empty(),
            "recommended_version" => !self.recommended_version.is_empty(),
            "recommended_deployment" => !self.recommended_deployment.is_empty(),
            "labels" => !self.labels.is_empty(),
            "annotations" => !self.annotations.is_empty(),
            _ => false,
        }
    }

    fn copy_field(&mut self, from: &Self, path: &str) {
        match path {
            "display_name" => self.display_name.clone_from(&from.display_name),
            "description" => self.description.clone_from(&from.description),
            "availability" => self.availability.clone_from(&from.availability),
            "recommended_version" => self.recommended_version.clone_from(&from.recommended_version),
            "recommended_deployment" => {
                self.recommended_deployment.clone_from(&from.recommended_deployment);
            }
            "labels" => self.labels.clone_from(&from.labels),
            "annotations" => self.annotations.clone_from(&from.annotations),
            _ => {}
        }
    }
}

pub(crate) const DEFAULT_ORDER: &[OrderBy] = &[OrderBy::asc("project_id"), OrderBy::asc("api_id")];

impl Filterable for api::Model {
    const FIELDS: &'static [Field] = &[
        Field::new("name", FieldType::String, Some("key")),
        Field::new("project_id", FieldType::String, Some("project_id")),
        Field::new("api_id", FieldType::String, Some("api_id")),
        Field::new("display_name", FieldType::String, Some("display_name")),
        Field::new("description", FieldType::String, Some("description")),
        Field::new("create_time", FieldType::Timestamp, Some("create_time")),
        Field::new("update_time", FieldType::Timestamp, Some("update_time")),
        Field::new("availability", FieldType::String, Some("availability")),
        Field::new("recommended_version", FieldType::String, Some("recommended_version")),
        Field::new("recommended_deployment", FieldType::String, Some("recommended_deployment")),
        Field::new("labels", FieldType::StringMap, None),
    ];

    fn field_map(&self) -> FieldMap {
        HashMap::from([
            ("name", Value::String(self.key.clone())),
            ("project_id", Value::String(self.project_id.clone())),
            ("api_id", Value::String(self.api_id.clone())),
            ("display_name", Value::String(self.display_name.clone())),
            ("description", Value::String(self.description.clone())),
            ("create_time", Value::Timestamp(self.create_time)),
            ("update_time", Value::Timestamp(self.update_time)),
            ("availability", Value::String(self.availability.clone())),
            ("recommended_version", Value::String(self.recommended_version.clone())),
            ("recommended_deployment", Value::String(self.recommended_deployment.clone())),
            ("labels", Value::StringMap(labels_from_json(&self.labels))),
        ])
    }
}
