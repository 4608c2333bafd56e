//! SeaORM entities for the registry tables
//!
//! Every table is keyed by the full resource name and carries the ancestor id
//! columns, so scoped queries and cascading deletes never parse keys.
//! Revisioned kinds (specs, deployments) store one row per revision.

pub mod api;
pub mod artifact;
pub mod blob;
pub mod deployment;
pub mod deployment_revision_tag;
pub mod project;
pub mod spec;
pub mod spec_revision_tag;
pub mod version;

pub use api::Entity as ApiEntity;
pub use artifact::Entity as ArtifactEntity;
pub use blob::Entity as BlobEntity;
pub use deployment::Entity as DeploymentEntity;
pub use deployment_revision_tag::Entity as DeploymentRevisionTagEntity;
pub use project::Entity as ProjectEntity;
pub use spec::Entity as SpecEntity;
pub use spec_revision_tag::Entity as SpecRevisionTagEntity;
pub use version::Entity as VersionEntity;
