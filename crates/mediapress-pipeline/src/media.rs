//! Media classification and transcoding.
//!
//! Classifies the (already signature-scanned) payload into image or video.
//! Video passes through untouched beyond the content-type allowlist; images
//! are decoded, policy-checked and thumbnailed. Image decode is CPU-bound and
//! runs off the async pool.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use mediapress_core::models::{ImageFormat, ImageMetadata, MediaAsset, MediaKind};
use mediapress_core::{constants, AppError, Config};

/// Policy limits applied during classification.
#[derive(Clone, Debug)]
pub struct MediaPolicy {
    pub max_dimension: u32,
    pub thumbnail_size: u32,
    pub video_content_types: Vec<String>,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            max_dimension: constants::DEFAULT_MAX_IMAGE_DIMENSION,
            thumbnail_size: constants::DEFAULT_THUMBNAIL_SIZE,
            video_content_types: constants::DEFAULT_VIDEO_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl MediaPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_dimension: config.max_image_dimension,
            thumbnail_size: config.thumbnail_size,
            video_content_types: config.video_content_types.clone(),
        }
    }
}

pub struct MediaClassifier {
    policy: MediaPolicy,
}

/// MIME inferred from a filename extension when the declared type is absent
/// or generic.
fn content_type_from_extension(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "mp4" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        "mov" => Some("video/quicktime"),
        "ogv" => Some("video/ogg"),
        _ => None,
    }
}

fn extension_for_video_type(content_type: &str, filename: &str) -> String {
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

impl MediaClassifier {
    pub fn new(policy: MediaPolicy) -> Self {
        Self { policy }
    }

    /// Normalize the declared MIME (strip parameters, lowercase); fall back
    /// to extension inference when it is absent or generic.
    pub fn normalize_content_type(declared: Option<&str>, filename: &str) -> Option<String> {
        let declared = declared
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_lowercase())
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");
        declared.or_else(|| content_type_from_extension(filename).map(String::from))
    }

    /// Classify and, for images, transcode.
    pub async fn process(
        &self,
        declared_content_type: Option<&str>,
        filename: &str,
        data: &[u8],
    ) -> Result<MediaAsset, AppError> {
        let content_type = Self::normalize_content_type(declared_content_type, filename)
            .ok_or_else(|| {
                AppError::UnsupportedMediaType(format!(
                    "Could not determine media type of '{}'",
                    filename
                ))
            })?;

        if content_type.starts_with("image/") {
            return self.process_image(data).await;
        }

        if self.policy.video_content_types.contains(&content_type) {
            let extension = extension_for_video_type(&content_type, filename);
            return Ok(MediaAsset {
                kind: MediaKind::Video,
                content_type,
                extension,
                thumbnail: None,
            });
        }

        Err(AppError::UnsupportedMediaType(content_type))
    }

    async fn process_image(&self, data: &[u8]) -> Result<MediaAsset, AppError> {
        let policy = self.policy.clone();
        let bytes = data.to_vec();
        let (metadata, thumbnail) =
            tokio::task::spawn_blocking(move || decode_and_thumbnail(&bytes, &policy))
                .await
                .map_err(|e| AppError::UnexpectedFailure(format!("decode task failed: {}", e)))??;

        Ok(MediaAsset {
            kind: MediaKind::Image(metadata),
            content_type: metadata.format.mime().to_string(),
            extension: metadata.format.extension().to_string(),
            thumbnail,
        })
    }
}

fn codec_for(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::WebP => image::ImageFormat::WebP,
        ImageFormat::Gif => image::ImageFormat::Gif,
    }
}

fn decode_and_thumbnail(
    data: &[u8],
    policy: &MediaPolicy,
) -> Result<(ImageMetadata, Option<Vec<u8>>), AppError> {
    let reader = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| AppError::ImageUndecodable(e.to_string()))?;

    // The detected format is authoritative, whatever the declared MIME said.
    let format = match reader.format() {
        Some(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
        Some(image::ImageFormat::Png) => ImageFormat::Png,
        Some(image::ImageFormat::WebP) => ImageFormat::WebP,
        Some(image::ImageFormat::Gif) => ImageFormat::Gif,
        Some(other) => {
            return Err(AppError::UnsupportedMediaType(format!(
                "Image format {:?} is not allowed",
                other
            )))
        }
        None => {
            return Err(AppError::ImageUndecodable(
                "Unrecognized image format".to_string(),
            ))
        }
    };

    let img = reader
        .decode()
        .map_err(|e| AppError::ImageUndecodable(e.to_string()))?;

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(AppError::ImageUndecodable(
            "Image reports zero dimensions".to_string(),
        ));
    }
    if width > policy.max_dimension || height > policy.max_dimension {
        return Err(AppError::DimensionsExceeded {
            width,
            height,
            max: policy.max_dimension,
        });
    }

    // Advisory self-test: some valid images fail strict re-encode validation,
    // so a failure here is logged, not fatal.
    if let Err(e) = reencode_probe(&img, format) {
        tracing::warn!(error = %e, "Image failed re-encode self-test, continuing");
    }

    let thumbnail = generate_thumbnail(&img, format, policy.thumbnail_size);

    Ok((
        ImageMetadata {
            width,
            height,
            format,
        },
        thumbnail,
    ))
}

fn reencode_probe(img: &DynamicImage, format: ImageFormat) -> anyhow::Result<()> {
    let (width, height) = img.dimensions();
    let probe = img.crop_imm(0, 0, width.min(8), height.min(8));
    encode_in_format(&probe, format)?;
    Ok(())
}

fn center_square(img: &DynamicImage) -> DynamicImage {
    let (width, height) = img.dimensions();
    let side = width.min(height);
    let x = (width - side) / 2;
    let y = (height - side) / 2;
    img.crop_imm(x, y, side, side)
}

/// Square thumbnail with a two-tier fallback. Returns `None` when both tiers
/// fail; the primary asset is still stored without a thumbnail.
fn generate_thumbnail(img: &DynamicImage, format: ImageFormat, size: u32) -> Option<Vec<u8>> {
    let square = center_square(img);

    match encode_resized(&square, format, size, FilterType::Lanczos3) {
        Ok(bytes) => return Some(bytes),
        Err(e) => {
            tracing::warn!(error = %e, "High-quality thumbnail resize failed, retrying lenient");
        }
    }

    match encode_resized_lenient(&square, format, size) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(error = %e, "Thumbnail generation failed, storing without thumbnail");
            None
        }
    }
}

fn encode_resized(
    img: &DynamicImage,
    format: ImageFormat,
    size: u32,
    filter: FilterType,
) -> anyhow::Result<Vec<u8>> {
    let resized = img.resize_exact(size, size, filter);
    encode_in_format(&resized, format)
}

fn encode_resized_lenient(
    img: &DynamicImage,
    format: ImageFormat,
    size: u32,
) -> anyhow::Result<Vec<u8>> {
    let resized = img.resize_exact(size, size, FilterType::Nearest);
    // Normalize the pixel buffer; strict encoders reject some color types.
    let normalized = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        _ => DynamicImage::ImageRgba8(resized.to_rgba8()),
    };
    encode_in_format(&normalized, format)
}

/// Encode preserving the original format family, so PNG/WebP/GIF thumbnails
/// keep alpha transparency. JPEG has no alpha channel and is flattened.
fn encode_in_format(img: &DynamicImage, format: ImageFormat) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);
    match format {
        ImageFormat::Jpeg => {
            DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut cursor, codec_for(format))?
        }
        _ => img.write_to(&mut cursor, codec_for(format))?,
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([0, 128, 255]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Jpeg)
            .unwrap();
        buffer
    }

    fn classifier() -> MediaClassifier {
        MediaClassifier::new(MediaPolicy {
            max_dimension: 2000,
            thumbnail_size: 64,
            ..MediaPolicy::default()
        })
    }

    #[test]
    fn normalize_prefers_declared_type() {
        assert_eq!(
            MediaClassifier::normalize_content_type(
                Some("image/JPEG; charset=binary"),
                "whatever.bin"
            ),
            Some("image/jpeg".to_string())
        );
    }

    #[test]
    fn normalize_falls_back_to_extension() {
        assert_eq!(
            MediaClassifier::normalize_content_type(
                Some("application/octet-stream"),
                "clip.MP4"
            ),
            Some("video/mp4".to_string())
        );
        assert_eq!(
            MediaClassifier::normalize_content_type(None, "photo.png"),
            Some("image/png".to_string())
        );
        assert_eq!(
            MediaClassifier::normalize_content_type(None, "unknown.xyz"),
            None
        );
    }

    #[tokio::test]
    async fn image_is_classified_with_true_dimensions() {
        let asset = classifier()
            .process(Some("image/jpeg"), "photo.jpg", &jpeg_bytes(800, 600))
            .await
            .unwrap();
        assert_eq!(asset.dimensions(), Some((800, 600)));
        assert_eq!(asset.content_type, "image/jpeg");
        assert_eq!(asset.extension, "jpg");
        assert!(asset.thumbnail.is_some());
    }

    #[tokio::test]
    async fn thumbnail_is_square_and_same_family() {
        let asset = classifier()
            .process(None, "photo.png", &png_bytes(200, 100))
            .await
            .unwrap();
        let thumb = asset.thumbnail.unwrap();
        let decoded = image::ImageReader::new(Cursor::new(&thumb))
            .with_guessed_format()
            .unwrap();
        assert_eq!(decoded.format(), Some(image::ImageFormat::Png));
        assert_eq!(decoded.decode().unwrap().dimensions(), (64, 64));
    }

    #[tokio::test]
    async fn detected_format_overrides_declared_mime() {
        // PNG bytes declared as JPEG still come back as image/png.
        let asset = classifier()
            .process(Some("image/jpeg"), "photo.jpg", &png_bytes(50, 50))
            .await
            .unwrap();
        assert_eq!(asset.content_type, "image/png");
    }

    #[tokio::test]
    async fn oversize_image_is_rejected() {
        let classifier = MediaClassifier::new(MediaPolicy {
            max_dimension: 100,
            thumbnail_size: 32,
            ..MediaPolicy::default()
        });
        let err = classifier
            .process(None, "big.png", &png_bytes(150, 50))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::DimensionsExceeded {
                width: 150,
                height: 50,
                max: 100
            }
        ));
    }

    #[tokio::test]
    async fn undecodable_image_is_rejected() {
        let err = classifier()
            .process(Some("image/png"), "broken.png", b"definitely not pixels")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ImageUndecodable(_)));
    }

    #[tokio::test]
    async fn disallowed_image_format_is_rejected() {
        let img = RgbImage::from_pixel(10, 10, Rgb([1, 2, 3]));
        let mut bmp = Vec::new();
        img.write_to(&mut Cursor::new(&mut bmp), image::ImageFormat::Bmp)
            .unwrap();
        let err = classifier()
            .process(Some("image/bmp"), "old.bmp", &bmp)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
    }

    #[tokio::test]
    async fn video_passes_through_unmodified() {
        let asset = classifier()
            .process(Some("video/mp4"), "clip.mp4", &[0, 0, 0, 0x18, b'f', b't', b'y', b'p'])
            .await
            .unwrap();
        assert!(asset.is_video());
        assert_eq!(asset.content_type, "video/mp4");
        assert_eq!(asset.extension, "mp4");
        assert!(asset.thumbnail.is_none());
    }

    #[tokio::test]
    async fn unknown_type_is_rejected() {
        let err = classifier()
            .process(Some("application/pdf"), "doc.pdf", b"%PDF-1.4")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
    }
}
