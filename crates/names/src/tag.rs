//! Revision tag names: `{spec|deployment}/tags/{tag}`
//!
//! A tag is also addressable as `{spec|deployment}@{tag}`; both spellings
//! convert into the corresponding revision name.

use crate::common::{anchored, validate_revision_tag, SEGMENT};
use crate::deployment::{deployment_body, DeploymentName, DeploymentRevisionName};
use crate::errors::NameError;
use crate::spec::{spec_body, SpecName, SpecRevisionName};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static SPEC_TAG: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!("{}/tags/{SEGMENT}", spec_body())));

static DEPLOYMENT_TAG: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!("{}/tags/{SEGMENT}", deployment_body())));

/// The revisioned resource a tag belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagTarget {
    Spec(SpecName),
    Deployment(DeploymentName),
}

impl fmt::Display for TagTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagTarget::Spec(spec) => spec.fmt(f),
            TagTarget::Deployment(deployment) => deployment.fmt(f),
        }
    }
}

/// Name of a revision tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionTagName {
    pub target: TagTarget,
    pub tag: String,
}

impl RevisionTagName {
    pub fn new(target: TagTarget, tag: impl Into<String>) -> Self {
        Self {
            target,
            tag: tag.into(),
        }
    }

    pub fn parse(name: &str) -> Result<Self, NameError> {
        if let Some(caps) = SPEC_TAG.captures(name) {
            let spec = SpecName::new(&caps[1], &caps[2], &caps[3], &caps[4]);
            return Ok(Self::new(TagTarget::Spec(spec), &caps[5]));
        }
        if let Some(caps) = DEPLOYMENT_TAG.captures(name) {
            let deployment = DeploymentName::new(&caps[1], &caps[2], &caps[3]);
            return Ok(Self::new(TagTarget::Deployment(deployment), &caps[4]));
        }
        Err(NameError::InvalidName {
            kind: "revision tag",
            name: name.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), NameError> {
        match &self.target {
            TagTarget::Spec(spec) => spec.validate()?,
            TagTarget::Deployment(deployment) => deployment.validate()?,
        }
        validate_revision_tag(&self.tag)
    }

    pub fn parent(&self) -> String {
        self.target.to_string()
    }

    /// The `name@tag` spelling of this tag
    pub fn revision_name(&self) -> String {
        format!("{}@{}", self.target, self.tag)
    }

    pub fn spec_revision(&self) -> Option<SpecRevisionName> {
        match &self.target {
            TagTarget::Spec(spec) => Some(spec.revision(self.tag.clone())),
            TagTarget::Deployment(_) => None,
        }
    }

    pub fn deployment_revision(&self) -> Option<DeploymentRevisionName> {
        match &self.target {
            TagTarget::Deployment(deployment) => Some(deployment.revision(self.tag.clone())),
            TagTarget::Spec(_) => None,
        }
    }
}

impl fmt::Display for RevisionTagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/tags/{}", self.target, self.tag)
    }
}
