//! # Prelude
//!
//! Re-exports the name types so callers can `use registry_names::prelude::*;`.

pub use crate::api::ApiName;
pub use crate::artifact::{ArtifactName, ArtifactParent};
pub use crate::common::{is_wildcard, validate_id, validate_revision_tag, LOCATION, WILDCARD};
pub use crate::deployment::{DeploymentName, DeploymentRevisionName};
pub use crate::errors::NameError;
pub use crate::project::ProjectName;
pub use crate::resolve::ResourceName;
pub use crate::spec::{SpecName, SpecRevisionName};
pub use crate::tag::{RevisionTagName, TagTarget};
pub use crate::version::VersionName;
