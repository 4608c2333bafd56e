//! # Prelude
//!
//! `use api_registry::prelude::*;` brings in the registry, its request and
//! message types, and the name types.

pub use crate::config::RegistryConfig;
pub use crate::error::{Code, RegistryError};
pub use crate::mask::FieldMask;
pub use crate::models::{
    Api, ApiDeployment, ApiSpec, Artifact, Contents, Labels, ListRequest, ListResponse, Project,
    Version,
};
pub use crate::notify::{ChangeType, LogNotifier, Notifier};
pub use crate::registry::Registry;
pub use registry_names::prelude::*;
