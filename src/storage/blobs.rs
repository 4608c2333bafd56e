//! Content blobs
//!
//! Spec revisions and artifacts keep their bytes in the `blobs` table under the
//! owner's storage key (`spec@revision` or the artifact name). Blob writes run
//! in the same transaction as the owner row, so a failed write leaves neither.
//! The bytes are stored as given; compressed contents stay compressed.

use super::client::Client;
use super::entities::{artifact, blob, spec, BlobEntity};
use crate::error::Result;
use chrono::{DateTime, Utc};
use sea_orm::ConnectionTrait;

/// Blob row holding the contents of a spec revision
pub fn spec_blob(revision: &spec::Model, contents: Vec<u8>, now: DateTime<Utc>) -> blob::Model {
    blob::Model {
        key: revision.key.clone(),
        project_id: revision.project_id.clone(),
        api_id: revision.api_id.clone(),
        version_id: revision.version_id.clone(),
        spec_id: revision.spec_id.clone(),
        deployment_id: String::new(),
        revision_id: revision.revision_id.clone(),
        artifact_id: String::new(),
        mime_type: revision.mime_type.clone(),
        hash: revision.hash.clone(),
        size_bytes: revision.size_bytes,
        contents,
        create_time: now,
        update_time: now,
    }
}

/// Blob row holding the contents of an artifact
pub fn artifact_blob(row: &artifact::Model, contents: Vec<u8>, now: DateTime<Utc>) -> blob::Model {
    blob::Model {
        key: row.key.clone(),
        project_id: row.project_id.clone(),
        api_id: row.api_id.clone(),
        version_id: row.version_id.clone(),
        spec_id: row.spec_id.clone(),
        deployment_id: row.deployment_id.clone(),
        revision_id: row.revision_id.clone(),
        artifact_id: row.artifact_id.clone(),
        mime_type: row.mime_type.clone(),
        hash: row.hash.clone(),
        size_bytes: row.size_bytes,
        contents,
        create_time: now,
        update_time: now,
    }
}

impl<C: ConnectionTrait> Client<'_, C> {
    /// Write a blob, replacing any previous contents under the same key
    pub async fn put_blob(&self, blob: blob::Model) -> Result<()> {
        let key = blob.key.clone();
        if let Some(existing) = self.find::<BlobEntity>(&key).await? {
            let replacement = blob::Model {
                create_time: existing.create_time,
                ..blob
            };
            self.update(&key, replacement.into_active()).await?;
        } else {
            self.insert(blob.into_active()).await?;
        }
        Ok(())
    }

    /// Blob stored for the owner key `key`; `name` is used in the `NotFound` message
    pub async fn get_blob(&self, key: &str, name: &str) -> Result<blob::Model> {
        self.get::<BlobEntity>(key, &format!("contents of {name}")).await
    }
}
