//! Request extraction: the authenticated identity and the multipart payload.
//!
//! Credential verification happens upstream; a middleware there inserts
//! `AuthenticatedUser` into request extensions. This module only checks its
//! presence and role.

use axum::extract::{FromRequestParts, Multipart};
use axum::http::request::Parts;
use mediapress_core::AppError;
use uuid::Uuid;

use crate::error::HttpAppError;

/// Identity injected by the upstream auth middleware.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub role: String,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(HttpAppError(AppError::Unauthenticated))
    }
}

pub fn require_upload_role(user: &AuthenticatedUser, allowed: &[String]) -> Result<(), AppError> {
    if allowed.iter().any(|role| role.eq_ignore_ascii_case(&user.role)) {
        Ok(())
    } else {
        Err(AppError::Forbidden(user.role.clone()))
    }
}

pub struct ExtractedFile {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

/// Extract the single `file` field from a multipart form.
pub async fn extract_multipart_file(mut multipart: Multipart) -> Result<ExtractedFile, AppError> {
    let mut extracted: Option<ExtractedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::MalformedUpload(format!("Failed to read multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        if extracted.is_some() {
            return Err(AppError::MalformedUpload(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            ));
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let content_type = field.content_type().map(|s| s.to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::MalformedUpload(format!("Failed to read file data: {}", e)))?
            .to_vec();

        extracted = Some(ExtractedFile {
            data,
            filename,
            content_type,
        });
    }

    extracted.ok_or(AppError::NoFilePresent)
}
