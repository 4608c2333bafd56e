//! Deployment names: `.../apis/{api}/deployments/{deployment}[@{revision}]`

use crate::api::ApiName;
use crate::artifact::{ArtifactName, ArtifactParent};
use crate::common::{anchored, is_wildcard, project_prefix, validate_all, REVISION_SUFFIX, SEGMENT};
use crate::errors::NameError;
use crate::project::ProjectName;
use crate::tag::{RevisionTagName, TagTarget};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub(crate) fn deployment_body() -> String {
    format!("{}/apis/{SEGMENT}/deployments/{SEGMENT}", project_prefix())
}

static DEPLOYMENT: LazyLock<Regex> = LazyLock::new(|| anchored(&deployment_body()));

static DEPLOYMENT_REVISION: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!("{}{REVISION_SUFFIX}", deployment_body())));

/// Name of a deployment, always referring to its current revision
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeploymentName {
    pub project_id: String,
    pub api_id: String,
    pub deployment_id: String,
}

impl DeploymentName {
    pub fn new(
        project_id: impl Into<String>,
        api_id: impl Into<String>,
        deployment_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            api_id: api_id.into(),
            deployment_id: deployment_id.into(),
        }
    }

    pub fn parse(name: &str) -> Result<Self, NameError> {
        let caps = DEPLOYMENT
            .captures(name)
            .ok_or_else(|| NameError::InvalidName {
                kind: "deployment",
                name: name.to_string(),
            })?;
        Ok(Self::new(&caps[1], &caps[2], &caps[3]))
    }

    pub fn validate(&self) -> Result<(), NameError> {
        validate_all(&[&self.project_id, &self.api_id, &self.deployment_id])
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
        self.api().has_wildcard() || is_wildcard(&self.deployment_id)
    }

    pub fn revision(&self, revision_id: impl Into<String>) -> DeploymentRevisionName {
        DeploymentRevisionName {
            project_id: self.project_id.clone(),
            api_id: self.api_id.clone(),
            deployment_id: self.deployment_id.clone(),
            revision_id: revision_id.into(),
        }
    }

    pub fn tag(&self, tag: impl Into<String>) -> RevisionTagName {
        RevisionTagName::new(TagTarget::Deployment(self.clone()), tag)
    }
}

impl fmt::Display for DeploymentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/deployments/{}", self.api(), self.deployment_id)
    }
}

impl FromStr for DeploymentName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Name of one deployment revision; an empty `revision_id` means current
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeploymentRevisionName {
    pub project_id: String,
    pub api_id: String,
    pub deployment_id: String,
    pub revision_id: String,
}

impl DeploymentRevisionName {
    pub fn parse(name: &str) -> Result<Self, NameError> {
        if let Some(caps) = DEPLOYMENT_REVISION.captures(name) {
            let revision_id = caps.get(4).map_or("", |m| m.as_str());
            return Ok(DeploymentName::new(&caps[1], &caps[2], &caps[3]).revision(revision_id));
        }
        match RevisionTagName::parse(name) {
            Ok(RevisionTagName {
                target: TagTarget::Deployment(deployment),
                tag,
            }) => Ok(deployment.revision(tag)),
            _ => Err(NameError::InvalidName {
                kind: "deployment revision",
                name: name.to_string(),
            }),
        }
    }

    pub fn validate(&self) -> Result<(), NameError> {
        self.deployment().validate()
    }

    pub fn deployment(&self) -> DeploymentName {
        DeploymentName::new(
            self.project_id.clone(),
            self.api_id.clone(),
            self.deployment_id.clone(),
        )
    }

    pub fn api(&self) -> ApiName {
        self.deployment().api()
    }

    pub fn project(&self) -> ProjectName {
        self.deployment().project()
    }

    pub fn parent(&self) -> String {
        self.deployment().parent()
    }

    pub fn has_revision(&self) -> bool {
        !self.revision_id.is_empty()
    }

    pub fn has_wildcard(&self) -> bool {
        self.deployment().has_wildcard() || is_wildcard(&self.revision_id)
    }

    pub fn artifact(&self, artifact_id: impl Into<String>) -> ArtifactName {
        ArtifactName::new(ArtifactParent::Deployment(self.clone()), artifact_id)
    }
}

impl fmt::Display for DeploymentRevisionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.revision_id.is_empty() {
            write!(f, "{}", self.deployment())
        } else {
            write!(f, "{}@{}", self.deployment(), self.revision_id)
        }
    }
}

impl FromStr for DeploymentRevisionName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DeploymentName> for DeploymentRevisionName {
    fn from(deployment: DeploymentName) -> Self {
        deployment.revision("")
    }
}
