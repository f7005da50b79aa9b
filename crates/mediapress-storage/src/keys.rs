//! Shared object key derivation.
//!
//! Keys are `{folder}/{timestamp}-{nonce}-{stem}.{ext}`; thumbnails live under
//! `{folder}/thumbnails/{filename}`. Sanitization lowercases, strips anything
//! outside `[a-z0-9-]` and collapses repeated separators, which keeps keys
//! URL- and filesystem-safe and closes path traversal via crafted filenames.

use mediapress_core::constants::DEFAULT_FOLDER;

/// Sanitize one path segment (folder name or filename stem).
///
/// Returns `None` when nothing survives sanitization.
pub fn sanitize_segment(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    let mut last_was_separator = true;
    for c in segment.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_separator = false;
        } else if !last_was_separator {
            out.push('-');
            last_was_separator = true;
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sanitize the request's target folder, falling back to the default.
pub fn sanitize_folder(folder: &str) -> String {
    sanitize_segment(folder).unwrap_or_else(|| DEFAULT_FOLDER.to_string())
}

/// Filename stem of an uploaded name, without its extension, sanitized.
pub fn sanitize_stem(original_filename: &str) -> String {
    let base = original_filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_filename);
    let stem = match base.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => base,
    };
    let stem: String = stem.chars().take(255).collect();
    sanitize_segment(&stem).unwrap_or_else(|| "file".to_string())
}

/// Object filename: `{timestamp}-{nonce}-{stem}.{ext}`.
pub fn object_filename(timestamp_millis: i64, nonce: u16, stem: &str, extension: &str) -> String {
    format!("{}-{:04x}-{}.{}", timestamp_millis, nonce, stem, extension)
}

pub fn object_key(folder: &str, filename: &str) -> String {
    format!("{}/{}", folder, filename)
}

pub fn thumbnail_key(folder: &str, filename: &str) -> String {
    format!("{}/thumbnails/{}", folder, filename)
}
