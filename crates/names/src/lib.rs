//! Typed resource names for the API registry
//!
//! Every registry resource is addressed by a structured path. This crate
//! parses those paths into typed values, validates user-supplied identifiers,
//! and derives parent and child names.
//!
//! ## Quick Start
//!
//! ```rust
//! use registry_names::prelude::*;
//!
//! let spec = SpecRevisionName::parse(
//!     "projects/demo/locations/global/apis/petstore/versions/v1/specs/openapi@prod",
//! )
//! .unwrap();
//! assert_eq!(spec.revision_id, "prod");
//! assert_eq!(spec.parent(), "projects/demo/locations/global/apis/petstore/versions/v1");
//! ```
//!
//! ## Grammar
//!
//! ```text
//! projects/{p}
//! projects/{p}/locations/global/apis/{a}
//! .../apis/{a}/versions/{v}
//! .../versions/{v}/specs/{s}[@{revision|tag}]
//! .../apis/{a}/deployments/{d}[@{revision|tag}]
//! {any of the above}/artifacts/{x}
//! {spec|deployment}/tags/{tag}
//! ```
//!
//! Any segment may be the wildcard `-` when the name is used as a list parent.
//! Parsing accepts wildcards and mixed case; `validate()` applies the stricter
//! identifier rules used when creating resources.

pub mod api;
pub mod artifact;
pub mod common;
pub mod deployment;
pub mod errors;
pub mod prelude;
pub mod project;
pub mod resolve;
pub mod spec;
pub mod tag;
pub mod version;
