//! API Registry Library
//!
//! Storage and revision engine for a hierarchical, versioned API registry:
//! projects, apis, versions, specs, deployments and artifacts, addressed by
//! structured resource names.
//!
//! ```no_run
//! use api_registry::prelude::*;
//!
//! # async fn demo() -> api_registry::error::Result<()> {
//! let registry = Registry::connect(&RegistryConfig::in_memory()).await?;
//! registry.create_project("demo", &Project::default()).await?;
//! let apis = registry
//!     .list_apis(&ListRequest::new("projects/demo/locations/global"))
//!     .await?;
//! assert!(apis.items.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod filtering;
pub mod logging;
pub mod mask;
pub mod models;
pub mod notify;
pub mod pagination;
pub mod prelude;
pub mod registry;
pub mod storage;
pub mod upsert;

pub use registry::Registry;
pub use registry_names as names;
