//! Media upload handler: multipart in, pipeline outcome out.

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use mediapress_core::constants::DEFAULT_FOLDER;
use mediapress_core::models::{
    Durability, DuplicateUploadResponse, ImageUploadResponse, RoutingFlags, UploadRequest,
    VideoUploadResponse,
};
use mediapress_pipeline::IngestOutcome;
use serde::Deserialize;

use crate::error::HttpAppError;
use crate::extract::{extract_multipart_file, require_upload_role, AuthenticatedUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub folder: Option<String>,
    /// Route video to the large-object backend.
    #[serde(default)]
    pub large: Option<bool>,
}

fn pending_flag(durability: Durability) -> Option<bool> {
    if durability.is_confirmed() {
        None
    } else {
        Some(true)
    }
}

pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    require_upload_role(&user, &state.config.upload_roles)?;

    let file = extract_multipart_file(multipart).await?;

    tracing::debug!(
        user_id = %user.id,
        filename = %file.filename,
        size = file.data.len(),
        "Received upload"
    );

    let request = UploadRequest {
        original_filename: file.filename,
        declared_content_type: file.content_type,
        declared_size: file.data.len() as u64,
        folder: query
            .folder
            .unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
        flags: RoutingFlags {
            prefer_large_object: query.large.unwrap_or(false),
        },
        data: file.data,
    };

    let outcome = state.pipeline.ingest(request).await?;

    let response = match outcome {
        IngestOutcome::Duplicate {
            url,
            thumbnail_url,
            fingerprint,
        } => Json(DuplicateUploadResponse {
            message: "File already uploaded; returning existing media".to_string(),
            url,
            thumbnail_url,
            duplicate: true,
            original_hash: fingerprint,
        })
        .into_response(),

        IngestOutcome::Stored(stored) if stored.is_video => Json(VideoUploadResponse {
            url: stored.url,
            filename: stored.filename,
            size: stored.size,
            media_type: "video".to_string(),
            folder: stored.folder,
            verification_pending: pending_flag(stored.durability),
        })
        .into_response(),

        IngestOutcome::Stored(stored) => Json(ImageUploadResponse {
            url: stored.url,
            thumb: stored.thumbnail_url,
            width: stored.width.unwrap_or(0),
            height: stored.height.unwrap_or(0),
            content_type: stored.content_type,
            hash: stored.fingerprint,
            verification_pending: pending_flag(stored.durability),
            thumb_verification_pending: stored.thumbnail_durability.and_then(pending_flag),
        })
        .into_response(),
    };

    Ok(response)
}
