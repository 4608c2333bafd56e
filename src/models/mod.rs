//! # Resource messages
//!
//! Plain serde structs exchanged with callers, plus the conversions between
//! them and storage rows. Each kind also declares its filter schema, default
//! list order and mutable fields.

pub mod api;
pub mod artifact;
pub mod deployment;
pub mod project;
pub mod spec;
pub mod version;

pub use api::Api;
pub use artifact::Artifact;
pub use deployment::ApiDeployment;
pub use project::Project;
pub use spec::ApiSpec;
pub use version::Version;

use crate::constants::{GZIP_MAGIC, GZIP_MIME_SUFFIX};
use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// User-defined key/value metadata
pub type Labels = BTreeMap<String, String>;

/// Parameters shared by every list operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    /// Parent name; any segment may be the wildcard `-`
    pub parent: String,
    pub filter: String,
    pub order_by: String,
    pub page_size: i32,
    pub page_token: String,
}

impl ListRequest {
    pub fn new(parent: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    #[must_use]
    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_page_token(mut self, page_token: impl Into<String>) -> Self {
        self.page_token = page_token.into();
        self
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    /// Empty when there are no further pages
    pub next_page_token: String,
}

/// Raw contents of a spec revision or artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contents {
    pub mime_type: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// Lowercase hex SHA-256 of `bytes`, or empty for empty contents
pub fn content_hash(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    format!("{:x}", Sha256::digest(bytes))
}

/// Length of `bytes` as stored in `size_bytes`
pub fn content_size(bytes: &[u8]) -> i64 {
    i64::try_from(bytes.len()).unwrap_or(i64::MAX)
}

/// True if the MIME type declares gzip-compressed contents
pub fn is_compressed(mime_type: &str) -> bool {
    mime_type.contains(GZIP_MIME_SUFFIX)
}

/// Reject contents that claim gzip compression but are not gzip streams
pub fn check_compression(mime_type: &str, bytes: &[u8]) -> Result<()> {
    if is_compressed(mime_type) && !bytes.is_empty() && !bytes.starts_with(&GZIP_MAGIC) {
        return Err(RegistryError::failed_precondition(format!(
            "contents are not gzip-compressed as declared by mime_type {mime_type:?}"
        )));
    }
    Ok(())
}

pub(crate) fn labels_to_json(labels: &Labels) -> serde_json::Value {
    serde_json::Value::Object(
        labels
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect(),
    )
}

pub(crate) fn labels_from_json(value: &serde_json::Value) -> Labels {
    crate::filtering::string_map(value)
}

/// Serde adapter storing bytes as standard base64
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash() {
        assert_eq!(content_hash(b""), "");
        assert_eq!(
            content_hash(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(content_size(b"hello"), 5);
    }

    #[test]
    fn test_check_compression() {
        let gzip = "application/x.openapi+gzip;version=3";
        assert!(check_compression(gzip, &[0x1f, 0x8b, 0x08, 0x00]).is_ok());
        assert!(check_compression(gzip, b"").is_ok(), "empty contents are allowed");
        let err = check_compression(gzip, b"openapi: 3.0.0").expect_err("plain text");
        assert_eq!(err.code(), crate::error::Code::FailedPrecondition);
        assert!(check_compression("application/yaml", b"openapi: 3.0.0").is_ok());
    }

    #[test]
    fn test_contents_serialize_as_base64() {
        let contents = Contents {
            mime_type: "text/plain".to_string(),
            data: b"hi".to_vec(),
        };
        let json = serde_json::to_value(&contents).expect("serialize");
        assert_eq!(json["data"], "aGk=");
        let back: Contents = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, contents);
    }

    #[test]
    fn test_labels_json() {
        let labels = Labels::from([("team".to_string(), "apis".to_string())]);
        assert_eq!(labels_from_json(&labels_to_json(&labels)), labels);
    }
}
