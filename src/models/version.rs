//! Version messages

use super::{labels_from_json, labels_to_json, Labels};
use crate::filtering::{Field, FieldMap, FieldType, Value};
use crate::mask::Masked;
use crate::pagination::{Filterable, OrderBy};
use crate::storage::entities::version;
use chrono::{DateTime, Utc};
use registry_names::version::VersionName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub state: String,
    /// Name of the spec that best describes this version
    pub primary_spec: String,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub annotations: Labels,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

impl Version {
    pub(crate) fn from_row(row: &version::Model) -> Self {
        Self {
            name: row.key.clone(),
            display_name: row.display_name.clone(),
            description: row.description.clone(),
            state: row.state.clone(),
            primary_spec: row.primary_spec.clone(),
            labels: labels_from_json(&row.labels),
            annotations: labels_from_json(&row.annotations),
            create_time: Some(row.create_time),
            update_time: Some(row.update_time),
        }
    }

    pub(crate) fn to_row(
        &self,
        name: &VersionName,
        create_time: DateTime<Utc>,
        update_time: DateTime<Utc>,
    ) -> version::Model {
        version::Model {
            key: name.to_string(),
            project_id: name.project_id.clone(),
            api_id: name.api_id.clone(),
            version_id: name.version_id.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            state: self.state.clone(),
            primary_spec: self.primary_spec.clone(),
            labels: labels_to_json(&self.labels),
            annotations: labels_to_json(&self.annotations),
            create_time,
            update_time,
        }
    }
}

impl Masked for Version {
    const MUTABLE: &'static [&'static str] = &[
        "display_name",
        "description",
        "state",
        "primary_spec",
        "labels",
        "annotations",
    ];
    const OUTPUT_ONLY: &'static [&'static str] = &["name", "create_time", "update_time"];

    fn is_populated(&self, path: &str) -> bool {
        match path {
            "display_name" => !self.display_name.is_empty(),
            "description" => !self.description.is_empty(),
            "state" => !self.state.is_empty(),
            "primary_spec" => !self.primary_spec.is_empty(),
            "labels" => !self.labels.is_empty(),
            "annotations" => !self.annotations.is_empty(),
            _ => false,
        }
    }

    fn copy_field(&mut self, from: &Self, path: &str) {
        match path {
            "display_name" => self.display_name.clone_from(&from.display_name),
            "description" => self.description.clone_from(&from.description),
            "state" => self.state.clone_from(&from.state),
            "primary_spec" => self.primary_spec.clone_from(&from.primary_spec),
            "labels" => self.labels.clone_from(&from.labels),
            "annotations" => self.annotations.clone_from(&from.annotations),
            _ => {}
        }
    }
}

pub(crate) const DEFAULT_ORDER: &[OrderBy] = &[
    OrderBy::asc("project_id"),
    OrderBy::asc("api_id"),
    OrderBy::asc("version_id"),
];

impl Filterable for version::Model {
    const FIELDS: &'static [Field] = &[
        Field::new("name", FieldType::String, Some("key")),
        Field::new("project_id", FieldType::String, Some("project_id")),
        Field::new("api_id", FieldType::String, Some("api_id")),
        Field::new("version_id", FieldType::String, Some("version_id")),
        Field::new("display_name", FieldType::String, Some("display_name")),
        Field::new("description", FieldType::String, Some("description")),
        Field::new("create_time", FieldType::Timestamp, Some("create_time")),
        Field::new("update_time", FieldType::Timestamp, Some("update_time")),
        Field::new("state", FieldType::String, Some("state")),
        Field::new("primary_spec", FieldType::String, Some("primary_spec")),
        Field::new("labels", FieldType::StringMap, None),
    ];

    fn field_map(&self) -> FieldMap {
        HashMap::from([
            ("name", Value::String(self.key.clone())),
            ("project_id", Value::String(self.project_id.clone())),
            ("api_id", Value::String(self.api_id.clone())),
            ("version_id", Value::String(self.version_id.clone())),
            ("display_name", Value::String(self.display_name.clone())),
            ("description", Value::String(self.description.clone())),
            ("create_time", Value::Timestamp(self.create_time)),
            ("update_time", Value::Timestamp(self.update_time)),
            ("state", Value::String(self.state.clone())),
            ("primary_spec", Value::String(self.primary_spec.clone())),
            ("labels", Value::StringMap(labels_from_json(&self.labels))),
        ])
    }
}
