//! Deployment messages

use super::{labels_from_json, labels_to_json, Labels};
use crate::filtering::{Field, FieldMap, FieldType, Value};
use crate::mask::Masked;
use crate::pagination::{Filterable, OrderBy};
use crate::storage::entities::deployment;
use chrono::{DateTime, Utc};
use registry_names::deployment::DeploymentName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDeployment {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub revision_id: String,
    /// Spec revision served by this deployment
    pub api_spec_revision: String,
    pub endpoint_uri: String,
    pub external_channel_uri: String,
    pub intended_audience: String,
    pub access_guidance: String,
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

impl ApiDeployment {
    pub(crate) fn from_row(row: &deployment::Model, name: String, revision_tags: Vec<String>) -> Self {
        Self {
            name,
            display_name: row.display_name.clone(),
            description: row.description.clone(),
            revision_id: row.revision_id.clone(),
            api_spec_revision: row.api_spec_revision.clone(),
            endpoint_uri: row.endpoint_uri.clone(),
            external_channel_uri: row.external_channel_uri.clone(),
            intended_audience: row.intended_audience.clone(),
            access_guidance: row.access_guidance.clone(),
            labels: labels_from_json(&row.labels),
            annotations: labels_from_json(&row.annotations),
            revision_tags,
            create_time: Some(row.create_time),
            revision_create_time: Some(row.revision_create_time),
            revision_update_time: Some(row.revision_update_time),
        }
    }

    pub(crate) fn to_row(
        &self,
        name: &DeploymentName,
        revision_id: &str,
        create_time: DateTime<Utc>,
        revision_create_time: DateTime<Utc>,
        revision_update_time: DateTime<Utc>,
    ) -> deployment::Model {
        deployment::Model {
            key: name.revision(revision_id).to_string(),
            project_id: name.project_id.clone(),
            api_id: name.api_id.clone(),
            deployment_id: name.deployment_id.clone(),
            revision_id: revision_id.to_string(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            api_spec_revision: self.api_spec_revision.clone(),
            endpoint_uri: self.endpoint_uri.clone(),
            external_channel_uri: self.external_channel_uri.clone(),
            intended_audience: self.intended_audience.clone(),
            access_guidance: self.access_guidance.clone(),
            labels: labels_to_json(&self.labels),
            annotations: labels_to_json(&self.annotations),
            create_time,
            revision_create_time,
            revision_update_time,
        }
    }
}

impl Masked for ApiDeployment {
    const MUTABLE: &'static [&'static str] = &[
        "display_name",
        "description",
        "api_spec_revision",
        "endpoint_uri",
        "external_channel_uri",
        "intended_audience",
        "access_guidance",
        "labels",
        "annotations",
    ];
    const OUTPUT_ONLY: &'static [&'static str] = &[
        "name",
        "revision_id",
        "revision_tags",
        "create_time",
        "revision_create_time",
        "revision_update_time",
    ];

    fn is_populated(&self, path: &str) -> bool {
        match path {
            "display_name" => !self.display_name.is_empty(),
            "description" => !self.description.is_empty(),
            "api_spec_revision" => !self.api_spec_revision.is_empty(),
            "endpoint_uri" => !self.endpoint_uri.is_empty(),
            "external_channel_uri" => !self.external_channel_uri.is_empty(),
            "intended_audience" => !self.intended_audience.is_empty(),
            "access_guidance" => !self.access_guidance.is_empty(),
            "labels" => !self.labels.is_empty(),
            "annotations" => !self.annotations.is_empty(),
            _ => false,
        }
    }

    fn copy_field(&mut self, from: &Self, path: &str) {
        match path {
            "display_name" => self.display_name.clone_from(&from.display_name),
            "description" => self.description.clone_from(&from.description),
            "api_spec_revision" => self.api_spec_revision.clone_from(&from.api_spec_revision),
            "endpoint_uri" => self.endpoint_uri.clone_from(&from.endpoint_uri),
            "external_channel_uri" => {
                self.external_channel_uri.clone_from(&from.external_channel_uri);
            }
            "intended_audience" => self.intended_audience.clone_from(&from.intended_audience),
            "access_guidance" => self.access_guidance.clone_from(&from.access_guidance),
            "labels" => self.labels.clone_from(&from.labels),
            "annotations" => self.annotations.clone_from(&from.annotations),
            _ => {}
        }
    }
}

pub(crate) const DEFAULT_ORDER: &[OrderBy] = &[
    OrderBy::asc("project_id"),
    OrderBy::asc("api_id"),
    OrderBy::asc("deployment_id"),
    OrderBy::desc("revision_create_time"),
];

impl Filterable for deployment::Model {
    const FIELDS: &'static [Field] = &[
        Field::new("name", FieldType::String, Some("key")),
        Field::new("project_id", FieldType::String, Some("project_id")),
        Field::new("api_id", FieldType::String, Some("api_id")),
        Field::new("deployment_id", FieldType::String, Some("deployment_id")),
        Field::new("revision_id", FieldType::String, Some("revision_id")),
        Field::new("display_name", FieldType::String, Some("display_name")),
        Field::new("description", FieldType::String, Some("description")),
        Field::new("create_time", FieldType::Timestamp, Some("create_time")),
        Field::new("revision_create_time", FieldType::Timestamp, Some("revision_create_time")),
        Field::new("revision_update_time", FieldType::Timestamp, Some("revision_update_time")),
        Field::new("api_spec_revision", FieldType::String, Some("api_spec_revision")),
        Field::new("endpoint_uri", FieldType::String, Some("endpoint_uri")),
        Field::new("external_channel_uri", FieldType::String, Some("external_channel_uri")),
        Field::new("intended_audience", FieldType::String, Some("intended_audience")),
        Field::new("access_guidance", FieldType::String, Some("access_guidance")),
        Field::new("labels", FieldType::StringMap, None),
    ];

    fn field_map(&self) -> FieldMap {
        let name = DeploymentName::new(&self.project_id, &self.api_id, &self.deployment_id);
        HashMap::from([
            ("name", Value::String(name.to_string())),
            ("project_id", Value::String(self.project_id.clone())),
            ("api_id", Value::String(self.api_id.clone())),
            ("deployment_id", Value::String(self.deployment_id.clone())),
            ("revision_id", Value::String(self.revision_id.clone())),
            ("display_name", Value::String(self.display_name.clone())),
            ("description", Value::String(self.description.clone())),
            ("create_time", Value::Timestamp(self.create_time)),
            ("revision_create_time", Value::Timestamp(self.revision_create_time)),
            ("revision_update_time", Value::Timestamp(self.revision_update_time)),
            ("api_spec_revision", Value::String(self.api_spec_revision.clone())),
            ("endpoint_uri", Value::String(self.endpoint_uri.clone())),
            ("external_channel_uri", Value::String(self.external_channel_uri.clone())),
            ("intended_audience", Value::String(self.intended_audience.clone())),
            ("access_guidance", Value::String(self.access_guidance.clone())),
            ("labels", Value::StringMap(labels_from_json(&self.labels))),
        ])
    }
}
