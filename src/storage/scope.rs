//! Id-scoped row conditions
//!
//! Every registry table carries the id columns of its ancestors. A [`Scope`]
//! turns a (possibly wildcarded) name into an equality condition on those
//! columns: a wildcard segment matches any non-empty id, an empty string
//! matches rows where that id does not apply.

use registry_names::prelude::*;
use sea_orm::sea_query::{Alias, Expr, SimpleExpr};
use sea_orm::Condition;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scope<'s> {
    pub project_id: Option<&'s str>,
    pub api_id: Option<&'s str>,
    pub version_id: Option<&'s str>,
    pub spec_id: Option<&'s str>,
    pub deployment_id: Option<&'s str>,
    pub revision_id: Option<&'s str>,
    pub artifact_id: Option<&'s str>,
}

impl<'s> Scope<'s> {
    pub fn project(name: &'s ProjectName) -> Self {
        Self {
            project_id: Some(&name.project_id),
            ..Self::default()
        }
    }

    pub fn api(name: &'s ApiName) -> Self {
        Self {
            project_id: Some(&name.project_id),
            api_id: Some(&name.api_id),
            ..Self::default()
        }
    }

    pub fn version(name: &'s VersionName) -> Self {
        Self {
            project_id: Some(&name.project_id),
            api_id: Some(&name.api_id),
            version_id: Some(&name.version_id),
            ..Self::default()
        }
    }

    pub fn spec(name: &'s SpecName) -> Self {
        Self {
            project_id: Some(&name.project_id),
            api_id: Some(&name.api_id),
            version_id: Some(&name.version_id),
            spec_id: Some(&name.spec_id),
            ..Self::default()
        }
    }

    pub fn deployment(name: &'s DeploymentName) -> Self {
        Self {
            project_id: Some(&name.project_id),
            api_id: Some(&name.api_id),
            deployment_id: Some(&name.deployment_id),
            ..Self::default()
        }
    }

    /// Rows directly attached to `parent`: ids below the parent must be empty
    pub fn artifacts_of(parent: &'s ArtifactParent) -> Self {
        Self {
            project_id: Some(parent.project_id()),
            api_id: Some(parent.api_id()),
            version_id: Some(parent.version_id()),
            spec_id: Some(parent.spec_id()),
            deployment_id: Some(parent.deployment_id()),
            revision_id: match parent {
                ArtifactParent::Spec(_) | ArtifactParent::Deployment(_)
                    if parent.revision_id().is_empty() =>
                {
                    None
                }
                _ => Some(parent.revision_id()),
            },
            artifact_id: None,
        }
    }

    #[must_use]
    pub fn with_revision(mut self, revision_id: &'s str) -> Self {
        self.revision_id = Some(revision_id);
        self
    }

    /// Equality condition on every constrained id
    ///
    /// A wildcard matches any non-empty id, so `versions/-` never picks up rows
    /// attached directly to the api.
    pub fn condition(&self) -> Condition {
        let columns = [
            ("project_id", self.project_id),
            ("api_id", self.api_id),
            ("version_id", self.version_id),
            ("spec_id", self.spec_id),
            ("deployment_id", self.deployment_id),
            ("revision_id", self.revision_id),
            ("artifact_id", self.artifact_id),
        ];
        columns
            .into_iter()
            .filter_map(|(column, id)| id.map(|id| (column, id)))
            .fold(Condition::all(), |cond, (column, id)| {
                let column = Expr::col(Alias::new(column));
                if is_wildcard(id) {
                    cond.add(column.ne(""))
                } else {
                    cond.add(column.eq(id))
                }
            })
    }
}

/// Matches the row with the given storage key
pub fn key_is(key: &str) -> SimpleExpr {
    Expr::col(Alias::new("key")).eq(key)
}

/// Restricts `specs` rows to the current revision of each spec
pub fn current_spec_revision() -> SimpleExpr {
    Expr::cust(
        "specs.revision_id = (SELECT s2.revision_id FROM specs AS s2 \
         WHERE s2.project_id = specs.project_id AND s2.api_id = specs.api_id \
         AND s2.version_id = specs.version_id AND s2.spec_id = specs.spec_id \
         ORDER BY s2.revision_create_time DESC LIMIT 1)",
    )
}

/// Restricts `deployments` rows to the current revision of each deployment
pub fn current_deployment_revision() -> SimpleExpr {
    Expr::cust(
        "deployments.revision_id = (SELECT d2.revision_id FROM deployments AS d2 \
         WHERE d2.project_id = deployments.project_id AND d2.api_id = deployments.api_id \
         AND d2.deployment_id = deployments.deployment_id \
         ORDER BY d2.revision_create_time DESC LIMIT 1)",
    )
}

/// Restricts `artifacts` rows under specs to those of each spec's current revision
pub fn artifacts_of_current_spec_revision() -> SimpleExpr {
    Expr::cust(
        "artifacts.revision_id = (SELECT s2.revision_id FROM specs AS s2 \
         WHERE s2.project_id = artifacts.project_id AND s2.api_id = artifacts.api_id \
         AND s2.version_id = artifacts.version_id AND s2.spec_id = artifacts.spec_id \
         ORDER BY s2.revision_create_time DESC LIMIT 1)",
    )
}

/// Restricts `artifacts` rows under deployments to those of each deployment's current revision
pub fn artifacts_of_current_deployment_revision() -> SimpleExpr {
    Expr::cust(
        "artifacts.revision_id = (SELECT d2.revision_id FROM deployments AS d2 \
         WHERE d2.project_id = artifacts.project_id AND d2.api_id = artifacts.api_id \
         AND d2.deployment_id = artifacts.deployment_id \
         ORDER BY d2.revision_create_time DESC LIMIT 1)",
    )
}
