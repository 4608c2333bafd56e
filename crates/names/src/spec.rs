//! Spec names: `.../versions/{version}/specs/{spec}[@{revision}]`

use crate::api::ApiName;
use crate::artifact::{ArtifactName, ArtifactParent};
use crate::common::{anchored, is_wildcard, project_prefix, validate_all, REVISION_SUFFIX, SEGMENT};
use crate::errors::NameError;
use crate::project::ProjectName;
use crate::tag::{RevisionTagName, TagTarget};
use crate::version::VersionName;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub(crate) fn spec_body() -> String {
    format!(
        "{}/apis/{SEGMENT}/versions/{SEGMENT}/specs/{SEGMENT}",
        project_prefix()
    )
}

static SPEC: LazyLock<Regex> = LazyLock::new(|| anchored(&spec_body()));

static SPEC_REVISION: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!("{}{REVISION_SUFFIX}", spec_body())));

/// Name of a spec, always referring to its current revision
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecName {
    pub project_id: String,
    pub api_id: String,
    pub version_id: String,
    pub spec_id: String,
}

impl SpecName {
    pub fn new(
        project_id: impl Into<String>,
        api_id: impl Into<String>,
        version_id: impl Into<String>,
        spec_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            api_id: api_id.into(),
            version_id: version_id.into(),
            spec_id: spec_id.into(),
        }
    }

    /// Parse a spec name; a revision suffix is rejected
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let caps = SPEC.captures(name).ok_or_else(|| NameError::InvalidName {
            kind: "spec",
            name: name.to_string(),
        })?;
        Ok(Self::new(&caps[1], &caps[2], &caps[3], &caps[4]))
    }

    pub fn validate(&self) -> Result<(), NameError> {
        validate_all(&[&self.project_id, &self.api_id, &self.version_id, &self.spec_id])
    }

    pub fn project(&self) -> ProjectName {
        ProjectName::new(self.project_id.clone())
    }

    pub fn api(&self) -> ApiName {
        ApiName::new(self.project_id.clone(), self.api_id.clone())
    }

    pub fn version(&self) -> VersionName {
        VersionName::new(
            self.project_id.clone(),
            self.api_id.clone(),
            self.version_id.clone(),
        )
    }

    pub fn parent(&self) -> String {
        self.version().to_string()
    }

    pub fn has_wildcard(&self) -> bool {
        self.version().has_wildcard() || is_wildcard(&self.spec_id)
    }

    pub fn revision(&self, revision_id: impl Into<String>) -> SpecRevisionName {
        SpecRevisionName {
            project_id: self.project_id.clone(),
            api_id: self.api_id.clone(),
            version_id: self.version_id.clone(),
            spec_id: self.spec_id.clone(),
            revision_id: revision_id.into(),
        }
    }

    pub fn tag(&self, tag: impl Into<String>) -> RevisionTagName {
        RevisionTagName::new(TagTarget::Spec(self.clone()), tag)
    }
}

impl fmt::Display for SpecName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/specs/{}", self.version(), self.spec_id)
    }
}

impl FromStr for SpecName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Name of one spec revision
///
/// An empty `revision_id` refers to the current revision. The id may also be a
/// revision tag, which storage resolves to a concrete revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecRevisionName {
    pub project_id: String,
    pub api_id: String,
    pub version_id: String,
    pub spec_id: String,
    pub revision_id: String,
}

impl SpecRevisionName {
    /// Parse `spec`, `spec@revision`, `spec@tag` or `spec/tags/{tag}`
    pub fn parse(name: &str) -> Result<Self, NameError> {
        if let Some(caps) = SPEC_REVISION.captures(name) {
            let revision_id = caps.get(5).map_or("", |m| m.as_str());
            return Ok(SpecName::new(&caps[1], &caps[2], &caps[3], &caps[4]).revision(revision_id));
        }
        match RevisionTagName::parse(name) {
            Ok(RevisionTagName {
                target: TagTarget::Spec(spec),
                tag,
            }) => Ok(spec.revision(tag)),
            _ => Err(NameError::InvalidName {
                kind: "spec revision",
                name: name.to_string(),
            }),
        }
    }

    pub fn validate(&self) -> Result<(), NameError> {
        self.spec().validate()
    }

    pub fn spec(&self) -> SpecName {
        SpecName::new(
            self.project_id.clone(),
            self.api_id.clone(),
            self.version_id.clone(),
            self.spec_id.clone(),
        )
    }

    pub fn version(&self) -> VersionName {
        self.spec().version()
    }

    pub fn api(&self) -> ApiName {
        self.spec().api()
    }

    pub fn project(&self) -> ProjectName {
        self.spec().project()
    }

    pub fn parent(&self) -> String {
        self.spec().parent()
    }

    pub fn has_revision(&self) -> bool {
        !self.revision_id.is_empty()
    }

    pub fn has_wildcard(&self) -> bool {
        self.spec().has_wildcard() || is_wildcard(&self.revision_id)
    }

    pub fn artifact(&self, artifact_id: impl Into<String>) -> ArtifactName {
        ArtifactName::new(ArtifactParent::Spec(self.clone()), artifact_id)
    }
}

impl fmt::Display for SpecRevisionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.revision_id.is_empty() {
            write!(f, "{}", self.spec())
        } else {
            write!(f, "{}@{}", self.spec(), self.revision_id)
        }
    }
}

impl FromStr for SpecRevisionName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<SpecName> for SpecRevisionName {
    fn from(spec: SpecName) -> Self {
        spec.revision("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "projects/p/locations/global/apis/a/versions/v/specs/s";

    #[test]
    fn test_spec_rejects_revision_suffix() {
        assert!(SpecName::parse(BASE).is_ok());
        assert!(SpecName::parse(&format!("{BASE}@abc")).is_err());
    }

    #[test]
    fn test_spec_revision_forms() {
        let current = SpecRevisionName::parse(BASE).expect("bare name");
        assert!(!current.has_revision());
        assert_eq!(current.to_string(), BASE);

        let rev = SpecRevisionName::parse(&format!("{BASE}@1234abcd")).expect("revision");
        assert_eq!(rev.revision_id, "1234abcd");
        assert_eq!(rev.to_string(), format!("{BASE}@1234abcd"));

        let tagged = SpecRevisionName::parse(&format!("{BASE}/tags/prod")).expect("tag form");
        assert_eq!(tagged.revision_id, "prod");
        assert_eq!(tagged.to_string(), format!("{BASE}@prod"));
    }

    #[test]
    fn test_spec_wildcards() {
        let all = SpecRevisionName::parse("projects/p/locations/global/apis/-/versions/-/specs/-@-")
            .expect("wildcards parse");
        assert!(all.has_wildcard());
        assert!(all.validate().is_err(), "wildcards never validate");
    }

    #[test]
    fn test_spec_parent() {
        let spec = SpecName::parse(BASE).expect("spec");
        assert_eq!(spec.parent(), "projects/p/locations/global/apis/a/versions/v");
        assert_eq!(spec.api().parent(), "projects/p/locations/global");
    }
}
