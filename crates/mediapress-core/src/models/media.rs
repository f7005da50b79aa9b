//! Classified media asset models.

/// Image formats accepted for decoding and thumbnailing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl ImageFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::WebP => "webp",
            ImageFormat::Gif => "gif",
        }
    }
}

/// Pixel metadata extracted from a decoded image.
#[derive(Clone, Copy, Debug)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// Classified media kind; the branches share one transcode-to-targets contract.
#[derive(Clone, Debug)]
pub enum MediaKind {
    Image(ImageMetadata),
    Video,
}

/// Result of classification and transcoding: what will be stored.
#[derive(Clone, Debug)]
pub struct MediaAsset {
    pub kind: MediaKind,
    /// Normalized MIME of the primary object, derived from the detected
    /// format for images and from the (allowlisted) declared type for video.
    pub content_type: String,
    pub extension: String,
    /// Generated thumbnail bytes; absent when transcoding degraded or for video.
    pub thumbnail: Option<Vec<u8>>,
}

impl MediaAsset {
    pub fn is_video(&self) -> bool {
        matches!(self.kind, MediaKind::Video)
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match &self.kind {
            MediaKind::Image(meta) => Some((meta.width, meta.height)),
            MediaKind::Video => None,
        }
    }
}
