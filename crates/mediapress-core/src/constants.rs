//! Shared defaults for the ingestion pipeline. Config::from_env overrides these.

/// Maximum number of concurrently in-flight ingestions.
pub const DEFAULT_ADMISSION_CAPACITY: usize = 2;

/// Age after which an unreleased admission slot is reaped.
pub const DEFAULT_SLOT_STALE_AFTER_SECS: u64 = 300;

/// Lifetime of a dedup index entry.
pub const DEFAULT_DEDUP_TTL_SECS: u64 = 86_400;

/// Interval between sweeper runs (slot reaping + dedup eviction).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Largest accepted image dimension, either axis.
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 2000;

/// Side length of generated square thumbnails.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 300;

/// Attempt budget for integrity size checks.
pub const DEFAULT_INTEGRITY_ATTEMPTS: usize = 3;

/// Fixed delay between integrity check attempts.
pub const DEFAULT_INTEGRITY_DELAY_MS: u64 = 100;

/// Attempt budget for post-write verification polling.
pub const DEFAULT_VERIFY_ATTEMPTS: usize = 5;

/// Base delay for verification polling backoff.
pub const DEFAULT_VERIFY_BASE_DELAY_MS: u64 = 200;

/// Lifetime of presigned direct-upload URLs.
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 900;

/// Maximum accepted request payload.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Roles permitted to upload media.
pub const DEFAULT_UPLOAD_ROLES: &[&str] = &["admin", "tutor", "content-writer"];

/// Video content types accepted for passthrough storage.
pub const DEFAULT_VIDEO_CONTENT_TYPES: &[&str] =
    &["video/mp4", "video/webm", "video/quicktime", "video/ogg"];

/// Folder used when the request names none (or an entirely invalid one).
pub const DEFAULT_FOLDER: &str = "media";
