//! Error types module
//!
//! All ingestion failures are unified under the `AppError` enum. Each variant
//! maps to one HTTP-equivalent status and a machine-readable code through the
//! `ErrorMetadata` trait so transports render errors consistently.

use std::io;

/// Metadata for error responses - defines how an error should be presented.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "INTEGRITY_MISMATCH")
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Role '{0}' is not permitted to upload media")]
    Forbidden(String),

    #[error("No file present in request")]
    NoFilePresent,

    #[error("Malformed upload request: {0}")]
    MalformedUpload(String),

    #[error("Payload truncated: declared {declared} bytes, received {received}")]
    PayloadTruncated { declared: u64, received: u64 },

    #[error("Integrity mismatch: declared {declared} bytes, observed {observed}")]
    IntegrityMismatch { declared: u64, observed: u64 },

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Malicious content detected: {name}")]
    MaliciousContentDetected { name: String, description: String },

    #[error("Image could not be decoded: {0}")]
    ImageUndecodable(String),

    #[error("Image dimensions {width}x{height} exceed the {max}px limit")]
    DimensionsExceeded { width: u32, height: u32, max: u32 },

    #[error("Too many concurrent uploads")]
    TooManyConcurrentUploads,

    #[error("Storage backend unavailable: {0}")]
    StorageBackendUnavailable(String),

    #[error("Unexpected failure: {0}")]
    UnexpectedFailure(String),

    #[error("Unexpected failure: {message}")]
    UnexpectedWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::UnexpectedWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::UnexpectedFailure(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::UnexpectedFailure(format!("JSON error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str) {
    match err {
        AppError::Unauthenticated => (401, "UNAUTHENTICATED"),
        AppError::Forbidden(_) => (403, "FORBIDDEN"),
        AppError::NoFilePresent => (400, "NO_FILE_PRESENT"),
        AppError::MalformedUpload(_) => (400, "MALFORMED_UPLOAD"),
        AppError::PayloadTruncated { .. } => (400, "PAYLOAD_TRUNCATED"),
        AppError::IntegrityMismatch { .. } => (400, "INTEGRITY_MISMATCH"),
        AppError::UnsupportedMediaType(_) => (415, "UNSUPPORTED_MEDIA_TYPE"),
        AppError::MaliciousContentDetected { .. } => (422, "MALICIOUS_CONTENT_DETECTED"),
        AppError::ImageUndecodable(_) => (400, "IMAGE_UNDECODABLE"),
        AppError::DimensionsExceeded { .. } => (400, "DIMENSIONS_EXCEEDED"),
        AppError::TooManyConcurrentUploads => (429, "TOO_MANY_CONCURRENT_UPLOADS"),
        AppError::StorageBackendUnavailable(_) => (502, "STORAGE_BACKEND_UNAVAILABLE"),
        AppError::UnexpectedFailure(_) => (500, "UNEXPECTED_FAILURE"),
        AppError::UnexpectedWithSource { .. } => (500, "UNEXPECTED_FAILURE"),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }
}
