//! JSON response models exposed to collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Successful image ingestion.
#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub url: String,
    pub thumb: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "type")]
    pub content_type: String,
    pub hash: String,
    #[serde(
        rename = "verificationPending",
        skip_serializing_if = "Option::is_none"
    )]
    pub verification_pending: Option<bool>,
    #[serde(
        rename = "thumbVerificationPending",
        skip_serializing_if = "Option::is_none"
    )]
    pub thumb_verification_pending: Option<bool>,
}

/// Successful video ingestion (passthrough, no transcoding).
#[derive(Debug, Serialize)]
pub struct VideoUploadResponse {
    pub url: String,
    pub filename: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub media_type: String,
    pub folder: String,
    #[serde(
        rename = "verificationPending",
        skip_serializing_if = "Option::is_none"
    )]
    pub verification_pending: Option<bool>,
}

/// Dedup short-circuit: the bytes were accepted before.
#[derive(Debug, Serialize)]
pub struct DuplicateUploadResponse {
    pub message: String,
    pub url: String,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
    pub duplicate: bool,
    #[serde(rename = "originalHash")]
    pub original_hash: String,
}

/// Request for a presigned direct-upload URL (large video).
#[derive(Debug, Deserialize)]
pub struct PresignedUploadRequest {
    pub filename: String,
    pub content_type: String,
    #[serde(default)]
    pub folder: Option<String>,
}

/// Presigned direct-upload grant.
#[derive(Debug, Serialize)]
pub struct PresignedUploadResponse {
    pub upload_url: String,
    pub public_url: String,
    pub key: String,
    pub expires_at: DateTime<Utc>,
}
