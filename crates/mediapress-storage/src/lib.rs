//! Mediapress Storage Library
//!
//! Storage abstraction and backends for the ingestion pipeline: the primary
//! blob store (local filesystem) and the secondary large-object backend
//! (S3-compatible, via `object_store`).
//!
//! # Object key format
//!
//! Keys are `{folder}/{timestamp}-{nonce}-{stem}.{ext}`, with thumbnails under
//! `{folder}/thumbnails/`. Folder and stem are sanitized to lowercase
//! alphanumerics and hyphens; keys never contain `..` or a leading `/`.
//! Derivation is centralized in the `keys` module so every producer agrees.

pub mod factory;
pub mod keys;
pub mod local;
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_large_object_storage, create_primary_storage};
pub use local::LocalStorage;
pub use mediapress_core::StorageBackend;
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
