//! Resolve an arbitrary string into a typed resource name

use crate::api::ApiName;
use crate::artifact::ArtifactName;
use crate::deployment::DeploymentRevisionName;
use crate::errors::NameError;
use crate::project::ProjectName;
use crate::spec::SpecRevisionName;
use crate::version::VersionName;
use std::fmt;

/// Any resource name the registry understands
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceName {
    Project(ProjectName),
    Api(ApiName),
    Version(VersionName),
    Spec(SpecRevisionName),
    Deployment(DeploymentRevisionName),
    Artifact(ArtifactName),
}

impl ResourceName {
    /// Try every grammar, most specific first
    pub fn parse(name: &str) -> Result<Self, NameError> {
        if let Ok(artifact) = ArtifactName::parse(name) {
            return Ok(ResourceName::Artifact(artifact));
        }
        if let Ok(spec) = SpecRevisionName::parse(name) {
            return Ok(ResourceName::Spec(spec));
        }
        if let Ok(deployment) = DeploymentRevisionName::parse(name) {
            return Ok(ResourceName::Deployment(deployment));
        }
        if let Ok(version) = VersionName::parse(name) {
            return Ok(ResourceName::Version(version));
        }
        if let Ok(api) = ApiName::parse(name) {
            return Ok(ResourceName::Api(api));
        }
        if let Ok(project) = ProjectName::parse(name) {
            return Ok(ResourceName::Project(project));
        }
        Err(NameError::Unrecognized(name.to_string()))
    }

    /// Short label for the resource kind
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceName::Project(_) => "project",
            ResourceName::Api(_) => "api",
            ResourceName::Version(_) => "version",
            ResourceName::Spec(_) => "spec",
            ResourceName::Deployment(_) => "deployment",
            ResourceName::Artifact(_) => "artifact",
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceName::Project(n) => n.fmt(f),
            ResourceName::Api(n) => n.fmt(f),
            ResourceName::Version(n) => n.fmt(f),
            ResourceName::Spec(n) => n.fmt(f),
            ResourceName::Deployment(n) => n.fmt(f),
            ResourceName::Artifact(n) => n.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_kinds() {
        let cases = vec![
            ("projects/p", "project"),
            ("projects/p/locations/global/apis/a", "api"),
            ("projects/p/locations/global/apis/a/versions/v", "version"),
            ("projects/p/locations/global/apis/a/versions/v/specs/s@r", "spec"),
            ("projects/p/locations/global/apis/a/deployments/d", "deployment"),
            ("projects/p/locations/global/artifacts/x", "artifact"),
            ("projects/p/locations/global/apis/a/versions/v/specs/s/artifacts/x", "artifact"),
        ];
        for (name, kind) in cases {
            let resolved = ResourceName::parse(name).expect("name should resolve");
            assert_eq!(resolved.kind(), kind, "'{name}'");
        }
        assert!(ResourceName::parse("apis/a").is_err());
        assert!(ResourceName::parse("projects/p/locations/global/apis/a/widgets/w").is_err());
    }
}
