//! Api names: `projects/{project}/locations/global/apis/{api}`

use crate::artifact::{ArtifactName, ArtifactParent};
use crate::common::{anchored, is_wildcard, project_prefix, validate_all, SEGMENT};
use crate::deployment::DeploymentName;
use crate::errors::NameError;
use crate::project::ProjectName;
use crate::version::VersionName;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static API: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!("{}/apis/{SEGMENT}", project_prefix())));

/// Name of an api
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiName {
    pub project_id: String,
    pub api_id: String,
}

impl ApiName {
    pub fn new(project_id: impl Into<String>, api_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_id: api_id.into(),
        }
    }

    pub fn parse(name: &str) -> Result<Self, NameError> {
        let caps = API.captures(name).ok_or_else(|| NameError::InvalidName {
            kind: "api",
            name: name.to_string(),
        })?;
        Ok(Self::new(&caps[1], &caps[2]))
    }

    pub fn validate(&self) -> Result<(), NameError> {
        validate_all(&[&self.project_id, &self.api_id])
    }

    pub fn project(&self) -> ProjectName {
        ProjectName::new(self.project_id.clone())
    }

    pub fn parent(&self) -> String {
        self.project().located()
    }

    /// True if any segment is a collection wildcard
    pub fn has_wildcard(&self) -> bool {
        is_wildcard(&self.project_id) || is_wildcard(&self.api_id)
    }

    pub fn version(&self, version_id: impl Into<String>) -> VersionName {
        VersionName::new(self.project_id.clone(), self.api_id.clone(), version_id)
    }

    pub fn deployment(&self, deployment_id: impl Into<String>) -> DeploymentName {
        DeploymentName::new(self.project_id.clone(), self.api_id.clone(), deployment_id)
    }

    pub fn artifact(&self, artifact_id: impl Into<String>) -> ArtifactName {
        ArtifactName::new(ArtifactParent::Api(self.clone()), artifact_id)
    }
}

impl fmt::Display for ApiName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/apis/{}", self.project().located(), self.api_id)
    }
}

impl FromStr for ApiName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
