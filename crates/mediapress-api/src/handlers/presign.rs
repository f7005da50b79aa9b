//! Presigned direct-upload handler for large video.
//!
//! Issues a short-lived PUT URL on the secondary backend plus the eventual
//! public URL, so clients upload large payloads without routing bytes
//! through this service.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use mediapress_core::models::{PresignedUploadRequest, PresignedUploadResponse};
use mediapress_core::AppError;
use mediapress_storage::keys;
use rand::Rng;

use crate::error::HttpAppError;
use crate::extract::{require_upload_role, AuthenticatedUser};
use crate::state::AppState;

fn video_extension(filename: &str, content_type: &str) -> String {
    if let Some((_, ext)) = filename.rsplit_once('.') {
        let ext = ext.to_lowercase();
        if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return ext;
        }
    }
    match content_type {
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "video/ogg" => "ogv",
        _ => "mp4",
    }
    .to_string()
}

pub async fn presign_upload(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(request): Json<PresignedUploadRequest>,
) -> Result<Json<PresignedUploadResponse>, HttpAppError> {
    require_upload_role(&user, &state.config.upload_roles)?;

    let storage = state.large_object.as_ref().ok_or_else(|| {
        AppError::StorageBackendUnavailable("Large-object backend is not configured".to_string())
    })?;

    // Direct upload exists for large video only; everything else goes
    // through the pipeline where it gets scanned.
    let content_type = request.content_type.trim().to_lowercase();
    if !state.config.video_content_types.contains(&content_type) {
        return Err(AppError::UnsupportedMediaType(content_type).into());
    }

    let folder = keys::sanitize_folder(request.folder.as_deref().unwrap_or(""));
    let stem = keys::sanitize_stem(&request.filename);
    let extension = video_extension(&request.filename, &content_type);
    let nonce: u16 = rand::rng().random_range(0..=u16::MAX);
    let filename = keys::object_filename(Utc::now().timestamp_millis(), nonce, &stem, &extension);
    let key = keys::object_key(&folder, &filename);

    let expires_in = Duration::from_secs(state.config.presign_expiry_secs);
    let upload_url = storage
        .presigned_put_url(&key, &content_type, expires_in)
        .await
        .map_err(|e| AppError::StorageBackendUnavailable(e.to_string()))?;
    let public_url = storage.public_url(&key);

    tracing::info!(
        user_id = %user.id,
        key = %key,
        expires_secs = state.config.presign_expiry_secs,
        "Issued presigned direct upload"
    );

    Ok(Json(PresignedUploadResponse {
        upload_url,
        public_url,
        key,
        expires_at: Utc::now() + chrono::Duration::seconds(state.config.presign_expiry_secs as i64),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_prefers_filename_then_content_type() {
        assert_eq!(video_extension("clip.WEBM", "video/mp4"), "webm");
        assert_eq!(video_extension("noext", "video/quicktime"), "mov");
        assert_eq!(video_extension("weird.!!", "video/mp4"), "mp4");
    }
}
