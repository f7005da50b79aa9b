//! End-to-end pipeline tests against local storage in a temp directory.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{Rgb, RgbImage};
use mediapress_core::models::{Durability, RoutingFlags, UploadRequest};
use mediapress_core::{AppError, Config, SystemClock};
use mediapress_pipeline::{IngestOutcome, IngestPipeline, SlotGuard};
use mediapress_storage::LocalStorage;

fn test_config() -> Config {
    Config {
        integrity_delay_ms: 1,
        verify_attempts: 3,
        verify_base_delay_ms: 1,
        thumbnail_size: 64,
        ..Config::default()
    }
}

async fn pipeline_in(dir: &tempfile::TempDir, config: &Config) -> IngestPipeline {
    let storage = LocalStorage::new(dir.path(), "http://localhost:3000/media".to_string())
        .await
        .unwrap();
    IngestPipeline::from_config(config, Arc::new(storage), None, Arc::new(SystemClock))
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Jpeg)
        .unwrap();
    buffer
}

fn request(filename: &str, content_type: Option<&str>, folder: &str, data: Vec<u8>) -> UploadRequest {
    UploadRequest {
        original_filename: filename.to_string(),
        declared_content_type: content_type.map(String::from),
        declared_size: data.len() as u64,
        folder: folder.to_string(),
        flags: RoutingFlags::default(),
        data,
    }
}

fn count_files(dir: &Path) -> usize {
    let mut count = 0;
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                count += count_files(&path);
            } else {
                count += 1;
            }
        }
    }
    count
}

#[tokio::test]
async fn image_upload_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(&dir, &test_config()).await;

    let outcome = pipeline
        .ingest(request(
            "Holiday Photo.jpg",
            Some("image/jpeg"),
            "blog",
            jpeg_bytes(800, 600),
        ))
        .await
        .unwrap();

    let stored = match outcome {
        IngestOutcome::Stored(stored) => stored,
        other => panic!("expected Stored, got {:?}", other),
    };

    assert_eq!(stored.width, Some(800));
    assert_eq!(stored.height, Some(600));
    assert_eq!(stored.content_type, "image/jpeg");
    assert!(!stored.is_video);
    assert_eq!(stored.folder, "blog");
    assert!(stored.url.contains("/blog/"));
    assert!(stored.url.ends_with(".jpg"));
    assert!(stored.thumbnail_url.contains("/blog/thumbnails/"));
    assert_eq!(stored.durability, Durability::Confirmed);
    assert_eq!(stored.thumbnail_durability, Some(Durability::Confirmed));
    assert_eq!(stored.fingerprint.len(), 64);

    // Primary object and thumbnail on disk, nothing else.
    assert_eq!(count_files(dir.path()), 2);
}

#[tokio::test]
async fn duplicate_upload_short_circuits_storage() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(&dir, &test_config()).await;
    let data = jpeg_bytes(100, 100);

    let first = pipeline
        .ingest(request("a.jpg", Some("image/jpeg"), "blog", data.clone()))
        .await
        .unwrap();
    let first_url = match first {
        IngestOutcome::Stored(stored) => stored.url.clone(),
        other => panic!("expected Stored, got {:?}", other),
    };
    let files_after_first = count_files(dir.path());

    // Same bytes under a different name still dedup to the same object.
    let second = pipeline
        .ingest(request("b.jpg", Some("image/jpeg"), "blog", data))
        .await
        .unwrap();
    match second {
        IngestOutcome::Duplicate { url, .. } => assert_eq!(url, first_url),
        other => panic!("expected Duplicate, got {:?}", other),
    }

    // Exactly one underlying storage write across both calls.
    assert_eq!(count_files(dir.path()), files_after_first);
}

#[tokio::test]
async fn executable_masquerading_as_image_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(&dir, &test_config()).await;

    let err = pipeline
        .ingest(request(
            "photo.jpg",
            Some("image/jpeg"),
            "blog",
            vec![0x4D, 0x5A, 0x90, 0x00],
        ))
        .await
        .unwrap_err();

    match err {
        AppError::MaliciousContentDetected { name, .. } => {
            assert_eq!(name, "Windows Executable");
        }
        other => panic!("expected MaliciousContentDetected, got {:?}", other),
    }
    assert_eq!(count_files(dir.path()), 0);
}

#[tokio::test]
async fn third_concurrent_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(&dir, &test_config()).await;

    // Two uploads already in flight.
    let _first = SlotGuard::try_acquire(pipeline.gate()).unwrap();
    let _second = SlotGuard::try_acquire(pipeline.gate()).unwrap();

    let err = pipeline
        .ingest(request(
            "c.jpg",
            Some("image/jpeg"),
            "blog",
            jpeg_bytes(50, 50),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::TooManyConcurrentUploads));

    // The in-flight pair is unaffected.
    assert_eq!(pipeline.gate().in_flight(), 2);

    // Capacity frees once they finish.
    drop(_first);
    drop(_second);
    assert!(pipeline
        .ingest(request(
            "c.jpg",
            Some("image/jpeg"),
            "blog",
            jpeg_bytes(50, 50),
        ))
        .await
        .is_ok());
}

#[tokio::test]
async fn oversize_image_is_rejected_without_storage_write() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        max_image_dimension: 100,
        ..test_config()
    };
    let pipeline = pipeline_in(&dir, &config).await;

    let err = pipeline
        .ingest(request(
            "big.jpg",
            Some("image/jpeg"),
            "blog",
            jpeg_bytes(150, 60),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DimensionsExceeded { .. }));
    assert_eq!(count_files(dir.path()), 0);
}

#[tokio::test]
async fn truncated_payload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(&dir, &test_config()).await;

    let mut req = request("a.jpg", Some("image/jpeg"), "blog", jpeg_bytes(50, 50));
    req.declared_size += 100;

    let err = pipeline.ingest(req).await.unwrap_err();
    assert!(matches!(err, AppError::PayloadTruncated { .. }));
    assert_eq!(count_files(dir.path()), 0);
}

#[tokio::test]
async fn video_passes_through_to_primary_storage() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(&dir, &test_config()).await;

    let mut data = vec![0x00, 0x00, 0x00, 0x18];
    data.extend_from_slice(b"ftypisom");
    data.extend_from_slice(&[0u8; 64]);
    let size = data.len() as u64;

    let outcome = pipeline
        .ingest(request("Clip One.mp4", Some("video/mp4"), "videos", data))
        .await
        .unwrap();

    let stored = match outcome {
        IngestOutcome::Stored(stored) => stored,
        other => panic!("expected Stored, got {:?}", other),
    };
    assert!(stored.is_video);
    assert_eq!(stored.size, size);
    assert_eq!(stored.content_type, "video/mp4");
    assert!(stored.filename.ends_with("-clip-one.mp4"));
    assert!(stored.width.is_none());
    // Video has no thumbnail object; the primary URL stands in.
    assert_eq!(stored.thumbnail_url, stored.url);
    assert_eq!(count_files(dir.path()), 1);
}

#[tokio::test]
async fn large_object_routing_without_backend_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(&dir, &test_config()).await;

    let mut req = request(
        "huge.mp4",
        Some("video/mp4"),
        "videos",
        vec![0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p'],
    );
    req.flags.prefer_large_object = true;

    let err = pipeline.ingest(req).await.unwrap_err();
    assert!(matches!(err, AppError::StorageBackendUnavailable(_)));
    assert_eq!(count_files(dir.path()), 0);

    // The failure released its admission slot.
    assert_eq!(pipeline.gate().in_flight(), 0);
}
