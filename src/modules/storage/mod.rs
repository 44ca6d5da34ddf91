//! Photo storage
//!
//! Report and resolution photos go to a MinIO/S3-compatible bucket under a
//! publicly readable prefix. Features depend on the [`PhotoStorage`] trait.

mod minio_client;
mod sigv4;

pub use minio_client::MinIOClient;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::shared::validation::encode_key_segment;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage configuration error: {0}")]
    Config(String),

    #[error("Failed to upload '{0}': {1}")]
    Upload(String, String),

    #[error("Failed to delete '{0}': {1}")]
    Delete(String, String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Signing error: {0}")]
    Signing(String),
}

/// What a stored photo documents, which decides its key namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    /// Photo submitted by a citizen, namespaced by user id
    Report,
    /// Photo proving a fix, namespaced by report id
    Resolution,
}

impl PhotoKind {
    fn segment(self) -> &'static str {
        match self {
            PhotoKind::Report => "reports",
            PhotoKind::Resolution => "resolutions",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredPhoto {
    pub key: String,
    pub url: String,
}

#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Prefix every key lives under
    fn prefix(&self) -> &str;

    /// Public URL for a stored key
    fn url_for(&self, key: &str) -> String;

    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Directory a photo of `kind` owned by `owner` is stored in, with trailing slash
    fn namespace(&self, kind: PhotoKind, owner: &str) -> String {
        format!(
            "{}/{}/{}/",
            self.prefix(),
            kind.segment(),
            encode_key_segment(owner)
        )
    }

    /// True when `key` was issued for `owner` under `kind`
    fn owns_key(&self, kind: PhotoKind, owner: &str, key: &str) -> bool {
        key.starts_with(&self.namespace(kind, owner)) && !key.contains("..")
    }

    /// Store a new photo under a fresh key and return where it lives
    async fn store(
        &self,
        kind: PhotoKind,
        owner: &str,
        extension: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredPhoto, StorageError> {
        let key = format!(
            "{}{}.{}",
            self.namespace(kind, owner),
            Uuid::now_v7(),
            extension
        );
        self.put(&key, data, content_type).await?;
        Ok(StoredPhoto {
            url: self.url_for(&key),
            key,
        })
    }
}
