use crate::{LocalStorage, S3Storage, Storage, StorageError, StorageResult};
use mediapress_core::{Config, StorageBackend};
use std::sync::Arc;

/// Create the primary blob store from configuration.
pub async fn create_primary_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackend::Local => {
            let storage = LocalStorage::new(
                config.local_storage_path.clone(),
                config.local_storage_base_url.clone(),
            )
            .await?;
            Ok(Arc::new(storage))
        }
        StorageBackend::S3 => Ok(Arc::new(create_s3(config).await?)),
    }
}

/// Create the secondary large-object backend, if configured.
///
/// Returns `Ok(None)` when no S3 bucket is set; the router then refuses
/// large-object routing rather than silently redirecting to the primary.
pub async fn create_large_object_storage(
    config: &Config,
) -> StorageResult<Option<Arc<dyn Storage>>> {
    if !config.large_object_configured() {
        return Ok(None);
    }
    Ok(Some(Arc::new(create_s3(config).await?)))
}

async fn create_s3(config: &Config) -> StorageResult<S3Storage> {
    let bucket = config
        .s3_bucket
        .clone()
        .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
    let region = config.s3_region.clone().ok_or_else(|| {
        StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
    })?;
    let endpoint = config.s3_endpoint.clone();

    S3Storage::new(bucket, region, endpoint).await
}
