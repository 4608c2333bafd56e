//! Artifact names and the polymorphic artifact parent
//!
//! Artifacts attach to projects, apis, versions, spec revisions and deployment
//! revisions. [`ArtifactParent::parse`] tries each grammar in turn
//! (spec, version, deployment, api, project) and returns the first match.

use crate::api::ApiName;
use crate::common::{anchored, is_wildcard, validate_id, LOCATION, SEGMENT};
use crate::deployment::{DeploymentName, DeploymentRevisionName};
use crate::errors::NameError;
use crate::project::ProjectName;
use crate::spec::{SpecName, SpecRevisionName};
use crate::version::VersionName;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static ARTIFACT: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!("(.+)/artifacts/{SEGMENT}")));

static PROJECT_WITH_LOCATION: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!("projects/{SEGMENT}/locations/{LOCATION}")));

/// The resource an artifact is attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactParent {
    Project(ProjectName),
    Api(ApiName),
    Version(VersionName),
    Spec(SpecRevisionName),
    Deployment(DeploymentRevisionName),
}

impl ArtifactParent {
    /// Resolve a parent name into whichever kind matches first
    pub fn parse(name: &str) -> Result<Self, NameError> {
        if let Ok(spec) = SpecRevisionName::parse(name) {
            return Ok(ArtifactParent::Spec(spec));
        }
        if let Ok(version) = VersionName::parse(name) {
            return Ok(ArtifactParent::Version(version));
        }
        if let Ok(deployment) = DeploymentRevisionName::parse(name) {
            return Ok(ArtifactParent::Deployment(deployment));
        }
        if let Ok(api) = ApiName::parse(name) {
            return Ok(ArtifactParent::Api(api));
        }
        if PROJECT_WITH_LOCATION.is_match(name) {
            return ProjectName::parse(name).map(ArtifactParent::Project);
        }
        Err(NameError::InvalidName {
            kind: "artifact parent",
            name: name.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), NameError> {
        match self {
            ArtifactParent::Project(p) => p.validate(),
            ArtifactParent::Api(a) => a.validate(),
            ArtifactParent::Version(v) => v.validate(),
            ArtifactParent::Spec(s) => s.validate(),
            ArtifactParent::Deployment(d) => d.validate(),
        }
    }

    pub fn project_id(&self) -> &str {
        match self {
            ArtifactParent::Project(p) => &p.project_id,
            ArtifactParent::Api(a) => &a.project_id,
            ArtifactParent::Version(v) => &v.project_id,
            ArtifactParent::Spec(s) => &s.project_id,
            ArtifactParent::Deployment(d) => &d.project_id,
        }
    }

    /// Api id, or "" for project artifacts
    pub fn api_id(&self) -> &str {
        match self {
            ArtifactParent::Project(_) => "",
            ArtifactParent::Api(a) => &a.api_id,
            ArtifactParent::Version(v) => &v.api_id,
            ArtifactParent::Spec(s) => &s.api_id,
            ArtifactParent::Deployment(d) => &d.api_id,
        }
    }

    /// Version id, or "" when the parent is not under a version
    pub fn version_id(&self) -> &str {
        match self {
            ArtifactParent::Version(v) => &v.version_id,
            ArtifactParent::Spec(s) => &s.version_id,
            _ => "",
        }
    }

    pub fn spec_id(&self) -> &str {
        match self {
            ArtifactParent::Spec(s) => &s.spec_id,
            _ => "",
        }
    }

    pub fn deployment_id(&self) -> &str {
        match self {
            ArtifactParent::Deployment(d) => &d.deployment_id,
            _ => "",
        }
    }

    /// Revision id of a spec or deployment parent ("" means current)
    pub fn revision_id(&self) -> &str {
        match self {
            ArtifactParent::Spec(s) => &s.revision_id,
            ArtifactParent::Deployment(d) => &d.revision_id,
            _ => "",
        }
    }

    pub fn has_wildcard(&self) -> bool {
        match self {
            ArtifactParent::Project(p) => p.is_wildcard(),
            ArtifactParent::Api(a) => a.has_wildcard(),
            ArtifactParent::Version(v) => v.has_wildcard(),
            ArtifactParent::Spec(s) => s.has_wildcard(),
            ArtifactParent::Deployment(d) => d.has_wildcard(),
        }
    }

    /// The same parent pinned to a concrete revision
    #[must_use]
    pub fn with_revision(&self, revision_id: &str) -> Self {
        match self {
            ArtifactParent::Spec(s) => ArtifactParent::Spec(s.spec().revision(revision_id)),
            ArtifactParent::Deployment(d) => {
                ArtifactParent::Deployment(d.deployment().revision(revision_id))
            }
            other => other.clone(),
        }
    }

    pub fn artifact(&self, artifact_id: impl Into<String>) -> ArtifactName {
        ArtifactName::new(self.clone(), artifact_id)
    }
}

impl fmt::Display for ArtifactParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactParent::Project(p) => f.write_str(&p.located()),
            ArtifactParent::Api(a) => a.fmt(f),
            ArtifactParent::Version(v) => v.fmt(f),
            ArtifactParent::Spec(s) => s.fmt(f),
            ArtifactParent::Deployment(d) => d.fmt(f),
        }
    }
}

impl From<ProjectName> for ArtifactParent {
    fn from(name: ProjectName) -> Self {
        ArtifactParent::Project(name)
    }
}

impl From<ApiName> for ArtifactParent {
    fn from(name: ApiName) -> Self {
        ArtifactParent::Api(name)
    }
}

impl From<VersionName> for ArtifactParent {
    fn from(name: VersionName) -> Self {
        ArtifactParent::Version(name)
    }
}

impl From<SpecName> for ArtifactParent {
    fn from(name: SpecName) -> Self {
        ArtifactParent::Spec(name.into())
    }
}

impl From<DeploymentName> for ArtifactParent {
    fn from(name: DeploymentName) -> Self {
        ArtifactParent::Deployment(name.into())
    }
}

/// Name of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactName {
    pub parent: ArtifactParent,
    pub artifact_id: String,
}

impl ArtifactName {
    pub fn new(parent: ArtifactParent, artifact_id: impl Into<String>) -> Self {
        Self {
            parent,
            artifact_id: artifact_id.into(),
        }
    }

    pub fn parse(name: &str) -> Result<Self, NameError> {
        let invalid = || NameError::InvalidName {
            kind: "artifact",
            name: name.to_string(),
        };
        let caps = ARTIFACT.captures(name).ok_or_else(invalid)?;
        let parent = ArtifactParent::parse(&caps[1]).ok().ok_or_else(invalid)?;
        Ok(Self::new(parent, &caps[2]))
    }

    pub fn validate(&self) -> Result<(), NameError> {
        self.parent.validate()?;
        validate_id(&self.artifact_id)
    }

    pub fn parent(&self) -> String {
        self.parent.to_string()
    }

    pub fn has_wildcard(&self) -> bool {
        self.parent.has_wildcard() || is_wildcard(&self.artifact_id)
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/artifacts/{}", self.parent, self.artifact_id)
    }
}

impl FromStr for ArtifactName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
