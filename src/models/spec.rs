//! Spec messages
//!
//! An [`ApiSpec`] describes one revision of a spec. `contents` is input only:
//! reads return `size_bytes` and `hash`, and the bytes are fetched separately
//! with `get_api_spec_contents`.

use super::{base64_bytes, labels_from_json, labels_to_json, Labels};
use crate::filtering::{Field, FieldMap, FieldType, Value};
use crate::mask::Masked;
use crate::pagination::{Filterable, OrderBy};
use crate::storage::entities::spec;
use chrono::{DateTime, Utc};
use registry_names::spec::SpecName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSpec {
    pub name: String,
    pub filename: String,
    pub description: String,
    pub revision_id: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub hash: String,
    pub source_uri: String,
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<u8>,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub annotations: Labels,
    #[serde(default)]
    pub revision_tags: Vec<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub revision_create_time: Option<DateTime<Utc>>,
    pub revision_update_time: Option<DateTime<Utc>>,
}

impl ApiSpec {
    pub(crate) fn from_row(row: &spec::Model, name: String, revision_tags: Vec<String>) -> Self {
        Self {
            name,
            filename: row.filename.clone(),
            description: row.description.clone(),
            revision_id: row.revision_id.clone(),
            mime_type: row.mime_type.clone(),
            size_bytes: row.size_bytes,
            hash: row.hash.clone(),
            source_uri: row.source_uri.clone(),
            contents: Vec::new(),
            labels: labels_from_json(&row.labels),
            annotations: labels_from_json(&row.annotations),
            revision_tags,
            create_time: Some(row.create_time),
            revision_create_time: Some(row.revision_create_time),
            revision_update_time: Some(row.revision_update_time),
        }
    }

    /// Row for revision `revision_id` of `name` carrying this message's fields
    pub(crate) fn to_row(
        &self,
        name: &SpecName,
        revision_id: &str,
        create_time: DateTime<Utc>,
        revision_create_time: DateTime<Utc>,
        revision_update_time: DateTime<Utc>,
    ) -> spec::Model {
        spec::Model {
            key: name.revision(revision_id).to_string(),
            project_id: name.project_id.clone(),
            api_id: name.api_id.clone(),
            version_id: name.version_id.clone(),
            spec_id: name.spec_id.clone(),
            revision_id: revision_id.to_string(),
            filename: self.filename.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes,
            hash: self.hash.clone(),
            source_uri: self.source_uri.clone(),
            labels: labels_to_json(&self.labels),
            annotations: labels_to_json(&self.annotations),
            create_time,
            revision_create_time,
            revision_update_time,
        }
    }
}

impl Masked for ApiSpec {
    const MUTABLE: &'static [&'static str] = &[
        "filename",
        "description",
        "mime_type",
        "source_uri",
        "contents",
        "labels",
        "annotations",
    ];
    const OUTPUT_ONLY: &'static [&'static str] = &[
        "name",
        "revision_id",
        "size_bytes",
        "hash",
        "revision_tags",
        "create_time",
        "revision_create_time",
        "revision_update_time",
    ];

    fn is_populated(&self, path: &str) -> bool {
        match path {
            "filename" => !self.filename.is_empty(),
            "description" => !self.description.is_empty(),
            "mime_type" => !self.mime_type.is_empty(),
            "source_uri" => !self.source_uri.is_empty(),
            "contents" => !self.contents.is_empty(),
            "labels" => !self.labels.is_empty(),
            "annotations" => !self.annotations.is_empty(),
            _ => false,
        }
    }

    fn copy_field(&mut self, from: &Self, path: &str) {
        match path {
            "filename" => self.filename.clone_from(&from.filename),
            "description" => self.description.clone_from(&from.description),
            "mime_type" => self.mime_type.clone_from(&from.mime_type),
            "source_uri" => self.source_uri.clone_from(&from.source_uri),
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
    OrderBy::desc("revision_create_time"),
];

impl Filterable for spec::Model {
    const FIELDS: &'static [Field] = &[
        Field::new("name", FieldType::String, Some("key")),
        Field::new("project_id", FieldType::String, Some("project_id")),
        Field::new("api_id", FieldType::String, Some("api_id")),
        Field::new("version_id", FieldType::String, Some("version_id")),
        Field::new("spec_id", FieldType::String, Some("spec_id")),
        Field::new("revision_id", FieldType::String, Some("revision_id")),
        Field::new("filename", FieldType::String, Some("filename")),
        Field::new("description", FieldType::String, Some("description")),
        Field::new("create_time", FieldType::Timestamp, Some("create_time")),
        Field::new("revision_create_time", FieldType::Timestamp, Some("revision_create_time")),
        Field::new("revision_update_time", FieldType::Timestamp, Some("revision_update_time")),
        Field::new("mime_type", FieldType::String, Some("mime_type")),
        Field::new("size_bytes", FieldType::Int, Some("size_bytes")),
        Field::new("source_uri", FieldType::String, Some("source_uri")),
        Field::new("labels", FieldType::StringMap, None),
    ];

    fn field_map(&self) -> FieldMap {
        let name = SpecName::new(&self.project_id, &self.api_id, &self.version_id, &self.spec_id);
        HashMap::from([
            ("name", Value::String(name.to_string())),
            ("project_id", Value::String(self.project_id.clone())),
            ("api_id", Value::String(self.api_id.clone())),
            ("version_id", Value::String(self.version_id.clone())),
            ("spec_id", Value::String(self.spec_id.clone())),
            ("revision_id", Value::String(self.revision_id.clone())),
            ("filename", Value::String(self.filename.clone())),
            ("description", Value::String(self.description.clone())),
            ("create_time", Value::Timestamp(self.create_time)),
            ("revision_create_time", Value::Timestamp(self.revision_create_time)),
            ("revision_update_time", Value::Timestamp(self.revision_update_time)),
            ("mime_type", Value::String(self.mime_type.clone())),
            ("size_bytes", Value::Int(self.size_bytes)),
            ("source_uri", Value::String(self.source_uri.clone())),
            ("labels", Value::StringMap(labels_from_json(&self.labels))),
        ])
    }
}
