//! Configuration module
//!
//! Environment-driven configuration for the ingestion service. Every knob has
//! a default from `constants`; `from_env` only overrides what is set.

use std::env;

use crate::constants;
use crate::storage_types::StorageBackend;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub max_upload_bytes: usize,
    // Admission gate
    pub admission_capacity: usize,
    pub slot_stale_after_secs: u64,
    // Dedup index
    pub dedup_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    // Media policy
    pub max_image_dimension: u32,
    pub thumbnail_size: u32,
    pub video_content_types: Vec<String>,
    // Retry budgets
    pub integrity_attempts: usize,
    pub integrity_delay_ms: u64,
    pub verify_attempts: usize,
    pub verify_base_delay_ms: u64,
    // Direct upload
    pub presign_expiry_secs: u64,
    // Authorization
    pub upload_roles: Vec<String>,
    // Storage
    pub storage_backend: StorageBackend,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            max_upload_bytes: constants::DEFAULT_MAX_UPLOAD_BYTES,
            admission_capacity: constants::DEFAULT_ADMISSION_CAPACITY,
            slot_stale_after_secs: constants::DEFAULT_SLOT_STALE_AFTER_SECS,
            dedup_ttl_secs: constants::DEFAULT_DEDUP_TTL_SECS,
            sweep_interval_secs: constants::DEFAULT_SWEEP_INTERVAL_SECS,
            max_image_dimension: constants::DEFAULT_MAX_IMAGE_DIMENSION,
            thumbnail_size: constants::DEFAULT_THUMBNAIL_SIZE,
            video_content_types: constants::DEFAULT_VIDEO_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            integrity_attempts: constants::DEFAULT_INTEGRITY_ATTEMPTS,
            integrity_delay_ms: constants::DEFAULT_INTEGRITY_DELAY_MS,
            verify_attempts: constants::DEFAULT_VERIFY_ATTEMPTS,
            verify_base_delay_ms: constants::DEFAULT_VERIFY_BASE_DELAY_MS,
            presign_expiry_secs: constants::DEFAULT_PRESIGN_EXPIRY_SECS,
            upload_roles: constants::DEFAULT_UPLOAD_ROLES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            storage_backend: StorageBackend::Local,
            local_storage_path: "./data/media".to_string(),
            local_storage_base_url: "http://localhost:3000/media".to_string(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_list(name: &str, default: Vec<String>) -> Vec<String> {
    env::var(name)
        .ok()
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Config::default();

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .map(|v| {
                StorageBackend::parse(&v)
                    .ok_or_else(|| anyhow::anyhow!("Unknown STORAGE_BACKEND '{}'", v))
            })
            .transpose()?
            .unwrap_or(defaults.storage_backend);

        let max_upload_mb: usize = parse_var(
            "MAX_UPLOAD_SIZE_MB",
            defaults.max_upload_bytes / 1024 / 1024,
        );

        Ok(Self {
            server_port: parse_var("PORT", defaults.server_port),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            admission_capacity: parse_var("ADMISSION_CAPACITY", defaults.admission_capacity),
            slot_stale_after_secs: parse_var(
                "SLOT_STALE_AFTER_SECS",
                defaults.slot_stale_after_secs,
            ),
            dedup_ttl_secs: parse_var("DEDUP_TTL_SECS", defaults.dedup_ttl_secs),
            sweep_interval_secs: parse_var("SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs),
            max_image_dimension: parse_var("MAX_IMAGE_DIMENSION", defaults.max_image_dimension),
            thumbnail_size: parse_var("THUMBNAIL_SIZE", defaults.thumbnail_size),
            video_content_types: parse_list(
                "VIDEO_ALLOWED_CONTENT_TYPES",
                defaults.video_content_types,
            ),
            integrity_attempts: parse_var("INTEGRITY_ATTEMPTS", defaults.integrity_attempts),
            integrity_delay_ms: parse_var("INTEGRITY_DELAY_MS", defaults.integrity_delay_ms),
            verify_attempts: parse_var("VERIFY_ATTEMPTS", defaults.verify_attempts),
            verify_base_delay_ms: parse_var("VERIFY_BASE_DELAY_MS", defaults.verify_base_delay_ms),
            presign_expiry_secs: parse_var("PRESIGN_EXPIRY_SECS", defaults.presign_expiry_secs),
            upload_roles: parse_list("UPLOAD_ROLES", defaults.upload_roles),
            storage_backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or(defaults.local_storage_path),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or(defaults.local_storage_base_url),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok().or(env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
        })
    }

    /// True when a secondary large-object backend is configured.
    pub fn large_object_configured(&self) -> bool {
        self.s3_bucket.is_some() && self.s3_region.is_some()
    }
}
