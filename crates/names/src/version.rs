//! Version names: `.../apis/{api}/versions/{version}`

use crate::api::ApiName;
use crate::artifact::{ArtifactName, ArtifactParent};
use crate::common::{anchored, is_wildcard, project_prefix, validate_all, SEGMENT};
use crate::errors::NameError;
use crate::project::ProjectName;
use crate::spec::SpecName;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    anchored(&format!(
        "{}/apis/{SEGMENT}/versions/{SEGMENT}",
        project_prefix()
    ))
});

/// Name of an api version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionName {
    pub project_id: String,
    pub api_id: String,
    pub version_id: String,
}

impl VersionName {
    pub fn new(
        project_id: impl Into<String>,
        api_id: impl Into<String>,
        version_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            api_id: api_id.into(),
            version_id: version_id.into(),
        }
    }

    pub fn parse(name: &str) -> Result<Self, NameError> {
        let caps = VERSION.captures(name).ok_or_else(|| NameError::InvalidName {
            kind: "version",
            name: name.to_string(),
        })?;
        Ok(Self::new(&caps[1], &caps[2], &caps[3]))
    }

    pub fn validate(&self) -> Result<(), NameError> {
        validate_all(&[&self.project_id, &self.api_id, &self.version_id])
    }

    pub fn project(&self) -> ProjectName {
        ProjectName::new(self.project_id.clone())
    }

    pub fn api(&self) -> ApiName {
        ApiName::new(self.project_id.clone(), self.api_id.clone())
    }

    pub fn parent(&self) -> String {
        self.api().to_string()
    }

    pub fn has_wildcard(&self) -> bool {
        self.api().has_wildcard() || is_wildcard(&self.version_id)
    }

    pub fn spec(&self, spec_id: impl Into<String>) -> SpecName {
        SpecName::new(
            self.project_id.clone(),
            self.api_id.clone(),
            self.version_id.clone(),
            spec_id,
        )
    }

    pub fn artifact(&self, artifact_id: impl Into<String>) -> ArtifactName {
        ArtifactName::new(ArtifactParent::Version(self.clone()), artifact_id)
    }
}

impl fmt::Display for VersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/versions/{}", self.api(), self.version_id)
    }
}

impl FromStr for VersionName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
