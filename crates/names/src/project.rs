//! Project names: `projects/{project}`

use crate::api::ApiName;
use crate::artifact::{ArtifactName, ArtifactParent};
use crate::common::{anchored, is_wildcard, project_prefix, validate_id, LOCATION};
use crate::errors::NameError;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static PROJECT: LazyLock<Regex> = LazyLock::new(|| anchored(&project_prefix()));

/// Name of a project
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectName {
    pub project_id: String,
}

impl ProjectName {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }

    /// Parse `projects/{p}` or `projects/{p}/locations/global`
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let caps = PROJECT.captures(name).ok_or_else(|| NameError::InvalidName {
            kind: "project",
            name: name.to_string(),
        })?;
        Ok(Self::new(&caps[1]))
    }

    pub fn validate(&self) -> Result<(), NameError> {
        validate_id(&self.project_id)
    }

    /// Projects are top-level resources
    pub fn parent(&self) -> String {
        String::new()
    }

    /// The located form used as the parent of apis and project artifacts
    pub fn located(&self) -> String {
        format!("projects/{}/locations/{LOCATION}", self.project_id)
    }

    pub fn is_wildcard(&self) -> bool {
        is_wildcard(&self.project_id)
    }

    pub fn api(&self, api_id: impl Into<String>) -> ApiName {
        ApiName::new(self.project_id.clone(), api_id)
    }

    pub fn artifact(&self, artifact_id: impl Into<String>) -> ArtifactName {
        ArtifactName::new(ArtifactParent::Project(self.clone()), artifact_id)
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}", self.project_id)
    }
}

impl FromStr for ProjectName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
