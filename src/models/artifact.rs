//! Artifact messages

use super::{base64_bytes, labels_from_json, labels_to_json, Labels};
use crate::filtering::{Field, FieldMap, FieldType, Value};
use crate::mask::Masked;
use crate::pagination::{Filterable, OrderBy};
use crate::storage::entities::artifact;
use chrono::{DateTime, Utc};
use registry_names::artifact::ArtifactName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub hash: String,
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<u8>,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub annotations: Labels,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

impl Artifact {
    pub(crate) fn from_row(row: &artifact::Model) -> Self {
        Self {
            name: row.key.clone(),
            mime_type: row.mime_type.clone(),
            size_bytes: row.size_bytes,
            hash: row.hash.clone(),
            contents: Vec::new(),
            labels: labels_from_json(&row.labels),
            annotations: labels_from_json(&row.annotations),
            create_time: Some(row.create_time),
            update_time: Some(row.update_time),
        }
    }

    /// Row for `name`, whose parent must already carry a concrete revision id
    pub(crate) fn to_row(
        &self,
        name: &ArtifactName,
        create_time: DateTime<Utc>,
        update_time: DateTime<Utc>,
    ) -> artifact::Model {
        let parent = &name.parent;
        artifact::Model {
            key: name.to_string(),
            project_id: parent.project_id().to_string(),
            api_id: parent.api_id().to_string(),
            version_id: parent.version_id().to_string(),
            spec_id: parent.spec_id().to_string(),
            deployment_id: parent.deployment_id().to_string(),
            revision_id: parent.revision_id().to_string(),
            artifact_id: name.artifact_id.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes,
            hash: self.hash.clone(),
            labels: labels_to_json(&self.labels),
            annotations: labels_to_json(&self.annotations),
            create_time,
            update_time,
        }
    }
}

impl Masked for Artifact {
    const MUTABLE: &'static [&'static str] = &["mime_type", "contents", "labels", "annotations"];
    const OUTPUT_ONLY: &'static [&'static str] =
        &["name", "size_bytes", "hash", "create_time", "update_time"];

    fn is_populated(&self, path: &str) -> bool {
        match path {
            "mime_type" => !self.mime_type.is_empty(),
            "contents" => !self.contents.is_empty(),
            "labels" => !self.labels.is_empty(),
            "annotations" => !self.annotations.is_empty(),
            _ => false,
        }
    }

    fn copy_field(&mut self, from: &Self, path: &str) {
        match path {
            "mime_type" => self.mime_type.clone_from(&from.mime_type),
            "contents" => self.contents.clone_from(&from.contents),
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
    OrderBy::asc("spec_id"),
    OrderBy::asc("deployment_id"),
    OrderBy::asc("artifact_id"),
    OrderBy::desc("create_time"),
];

impl Filterable for artifact::Model {
    const FIELDS: &'static [Field] = &[
        Field::new("name", FieldType::String, Some("key")),
        Field::new("project_id", FieldType::String, Some("project_id")),
        Field::new("api_id", FieldType::String, Some("api_id")),
        Field::new("version_id", FieldType::String, Some("version_id")),
        Field::new("spec_id", FieldType::String, Some("spec_id")),
        Field::new("deployment_id", FieldType::String, Some("deployment_id")),
        Field::new("revision_id", FieldType::String, Some("revision_id")),
        Field::new("artifact_id", FieldType::String, Some("artifact_id")),
        Field::new("create_time", FieldType::Timestamp, Some("create_time")),
        Field::new("update_time", FieldType::Timestamp, Some("update_time")),
        Field::new("mime_type", FieldType::String, Some("mime_type")),
        Field::new("size_bytes", FieldType::Int, Some("size_bytes")),
        Field::new("labels", FieldType::StringMap, None),
    ];

    fn field_map(&self) -> FieldMap {
        HashMap::from([
            ("name", Value::String(self.key.clone())),
            ("project_id", Value::String(self.project_id.clone())),
            ("api_id", Value::String(self.api_id.clone())),
            ("version_id", Value::String(self.version_id.clone())),
            ("spec_id", Value::String(self.spec_id.clone())),
            ("deployment_id", Value::String(self.deployment_id.clone())),
            ("revision_id", Value::String(self.revision_id.clone())),
            ("artifact_id", Value::String(self.artifact_id.clone())),
            ("create_time", Value::Timestamp(self.create_time)),
            ("update_time", Value::Timestamp(self.update_time)),
            ("mime_type", Value::String(self.mime_type.clone())),
            ("size_bytes", Value::Int(self.size_bytes)),
            ("labels", Value::StringMap(labels_from_json(&self.labels))),
        ])
    }
}
