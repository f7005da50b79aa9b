//! Storage abstraction trait
//!
//! All storage backends (local filesystem, S3) implement `Storage`. The
//! pipeline's upload executor works against this trait only; `exists` and
//! `content_length` are the HEAD-style probes used by verification polling.

use async_trait::async_trait;
use mediapress_core::StorageBackend;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Write one object and return its publicly accessible URL.
    ///
    /// A write happens at most once per target; callers must not retry it
    /// blindly (verification polling covers eventual consistency instead).
    async fn put(&self, key: &str, content_type: &str, data: Vec<u8>) -> StorageResult<String>;

    /// Existence probe, used by post-write verification.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Size in bytes of a stored object, if it exists.
    async fn content_length(&self, key: &str) -> StorageResult<u64>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Generate a presigned PUT URL for direct client uploads.
    ///
    /// Only supported by S3-compatible backends; others return `ConfigError`.
    async fn presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Public URL a stored object will be served from.
    fn public_url(&self, key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
