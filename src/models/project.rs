//! Project messages

use crate::filtering::{Field, FieldMap, FieldType, Value};
use crate::mask::Masked;
use crate::pagination::{Filterable, OrderBy};
use crate::storage::entities::project;
use chrono::{DateTime, Utc};
use registry_names::project::ProjectName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

impl Project {
    pub(crate) fn from_row(row: &project::Model) -> Self {
        Self {
            name: ProjectName::new(&row.project_id).to_string(),
            display_name: row.display_name.clone(),
            description: row.description.clone(),
            create_time: Some(row.create_time),
            update_time: Some(row.update_time),
        }
    }

    pub(crate) fn to_row(
        &self,
        name: &ProjectName,
        create_time: DateTime<Utc>,
        update_time: DateTime<Utc>,
    ) -> project::Model {
        project::Model {
            key: name.to_string(),
            project_id: name.project_id.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            create_time,
            update_time,
        }
    }
}

impl Masked for Project {
    const MUTABLE: &'static [&'static str] = &["display_name", "description"];
    const OUTPUT_ONLY: &'static [&'static str] = &["name", "create_time", "update_time"];

    fn is_populated(&self, path: &str) -> bool {
        match path {
            "display_name" => !self.display_name.is_empty(),
            "description" => !self.description.is_empty(),
            _ => false,
        }
    }

    fn copy_field(&mut self, from: &Self, path: &str) {
        match path {
            "display_name" => self.display_name.clone_from(&from.display_name),
            "description" => self.description.clone_from(&from.description),
            _ => {}
        }
    }
}

pub(crate) const DEFAULT_ORDER: &[OrderBy] = &[OrderBy::asc("project_id")];

impl Filterable for project::Model {
    const FIELDS: &'static [Field] = &[
        Field::new("name", FieldType::String, Some("key")),
        Field::new("project_id", FieldType::String, Some("project_id")),
        Field::new("display_name", FieldType::String, Some("display_name")),
        Field::new("description", FieldType::String, Some("description")),
        Field::new("create_time", FieldType::Timestamp, Some("create_time")),
        Field::new("update_time", FieldType::Timestamp, Some("update_time")),
    ];

    fn field_map(&self) -> FieldMap {
        HashMap::from([
            ("name", Value::String(self.key.clone())),
            ("project_id", Value::String(self.project_id.clone())),
            ("display_name", Value::String(self.display_name.clone())),
            ("description", Value::String(self.description.clone())),
            ("create_time", Value::Timestamp(self.create_time)),
            ("update_time", Value::Timestamp(self.update_time)),
        ])
    }
}
