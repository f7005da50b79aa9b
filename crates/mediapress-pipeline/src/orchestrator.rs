//! Pipeline orchestrator: one request lifecycle.
//!
//! Sequences admission, integrity verification, signature scanning, dedup
//! lookup, classification/transcoding, routing and commit. The admission slot
//! and the spooled temp file are RAII-scoped, so every exit path — success,
//! validation failure or unexpected error — releases them exactly once.

use std::sync::Arc;
use std::time::Duration;

use mediapress_core::models::{BackendChoice, Durability, UploadRequest};
use mediapress_core::{AppError, Clock, Config, RetryPolicy};
use mediapress_storage::Storage;

use crate::admission::{AdmissionGate, SlotGuard};
use crate::dedup::{fingerprint, DedupIndex};
use crate::executor::UploadExecutor;
use crate::integrity::IntegrityVerifier;
use crate::media::{MediaClassifier, MediaPolicy};
use crate::router::StorageRouter;
use crate::scanner::{scan, SecurityVerdict};

/// Committed upload, as reported to the transport layer.
#[derive(Clone, Debug)]
pub struct StoredMedia {
    pub url: String,
    pub thumbnail_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub content_type: String,
    pub fingerprint: String,
    pub size: u64,
    pub folder: String,
    pub filename: String,
    pub is_video: bool,
    pub durability: Durability,
    /// Absent when no separate thumbnail object was written.
    pub thumbnail_durability: Option<Durability>,
}

/// Result of one ingestion.
#[derive(Clone, Debug)]
pub enum IngestOutcome {
    Stored(Box<StoredMedia>),
    Duplicate {
        url: String,
        thumbnail_url: String,
        fingerprint: String,
    },
}

pub struct IngestPipeline {
    gate: Arc<AdmissionGate>,
    dedup: Arc<DedupIndex>,
    verifier: IntegrityVerifier,
    classifier: MediaClassifier,
    executor: UploadExecutor,
    primary: Arc<dyn Storage>,
    large_object: Option<Arc<dyn Storage>>,
}

impl IngestPipeline {
    pub fn from_config(
        config: &Config,
        primary: Arc<dyn Storage>,
        large_object: Option<Arc<dyn Storage>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gate = Arc::new(AdmissionGate::new(
            config.admission_capacity,
            Duration::from_secs(config.slot_stale_after_secs),
            clock.clone(),
        ));
        let dedup = Arc::new(DedupIndex::new(
            Duration::from_secs(config.dedup_ttl_secs),
            clock,
        ));
        let verifier = IntegrityVerifier::new(RetryPolicy::fixed(
            config.integrity_attempts,
            Duration::from_millis(config.integrity_delay_ms),
        ));
        let classifier = MediaClassifier::new(MediaPolicy::from_config(config));
        let executor = UploadExecutor::new(
            RetryPolicy::exponential(
                config.verify_attempts,
                Duration::from_millis(config.verify_base_delay_ms),
            )
            .with_max_delay(Duration::from_secs(5)),
        );

        Self {
            gate,
            dedup,
            verifier,
            classifier,
            executor,
            primary,
            large_object,
        }
    }

    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }

    pub fn dedup(&self) -> &Arc<DedupIndex> {
        &self.dedup
    }

    /// Run one upload through the full pipeline.
    pub async fn ingest(&self, request: UploadRequest) -> Result<IngestOutcome, AppError> {
        // Held for the whole request; dropping it releases the slot.
        let _slot = SlotGuard::try_acquire(&self.gate)?;

        tracing::info!(
            filename = %request.original_filename,
            declared_size = request.declared_size,
            folder = %request.folder,
            "Ingesting upload"
        );

        // Spool to disk; NamedTempFile removes itself on every exit path.
        let spooled = tempfile::NamedTempFile::new()?;
        tokio::fs::write(spooled.path(), &request.data).await?;

        let record = self
            .verifier
            .verify(request.declared_size, spooled.path(), &request.data)
            .await?;
        tracing::debug!(
            declared = record.declared,
            on_disk = record.on_disk,
            "Integrity verified"
        );

        if let SecurityVerdict::Flagged { name, description } = scan(&request.data) {
            tracing::warn!(
                rule = name,
                filename = %request.original_filename,
                "Rejected upload flagged by signature scanner"
            );
            return Err(AppError::MaliciousContentDetected {
                name: name.to_string(),
                description: description.to_string(),
            });
        }

        let content_hash = fingerprint(&request.data);
        if let Some(entry) = self.dedup.lookup(&content_hash) {
            tracing::info!(fingerprint = %content_hash, "Duplicate upload short-circuited");
            return Ok(IngestOutcome::Duplicate {
                url: entry.url,
                thumbnail_url: entry.thumbnail_url,
                fingerprint: content_hash,
            });
        }

        let asset = self
            .classifier
            .process(
                request.declared_content_type.as_deref(),
                &request.original_filename,
                &request.data,
            )
            .await?;

        let routed = StorageRouter::route(&request, &asset);
        let storage: &Arc<dyn Storage> = match routed.backend {
            BackendChoice::Primary => &self.primary,
            BackendChoice::LargeObject => self.large_object.as_ref().ok_or_else(|| {
                AppError::StorageBackendUnavailable(
                    "Large-object backend is not configured".to_string(),
                )
            })?,
        };

        let size = request.data.len() as u64;
        let dimensions = asset.dimensions();
        let is_video = asset.is_video();
        let content_type = asset.content_type.clone();
        let folder = routed
            .primary
            .key
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let filename = routed
            .primary
            .key
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        let primary_commit = self
            .executor
            .commit(storage.as_ref(), &routed.primary, request.data)
            .await?;

        // Thumbnail failures degrade to the primary URL; they never fail the
        // request once the primary object is committed.
        let (thumbnail_url, thumbnail_durability) = match (routed.thumbnail, asset.thumbnail) {
            (Some(target), Some(bytes)) => {
                match self.executor.commit(storage.as_ref(), &target, bytes).await {
                    Ok(commit) => (commit.url, Some(commit.durability)),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            key = %target.key,
                            "Thumbnail commit failed, reusing primary URL"
                        );
                        (primary_commit.url.clone(), None)
                    }
                }
            }
            _ => (primary_commit.url.clone(), None),
        };

        self.dedup.insert(
            content_hash.clone(),
            primary_commit.url.clone(),
            thumbnail_url.clone(),
        );

        Ok(IngestOutcome::Stored(Box::new(StoredMedia {
            url: primary_commit.url,
            thumbnail_url,
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
            content_type,
            fingerprint: content_hash,
            size,
            folder,
            filename,
            is_video,
            durability: primary_commit.durability,
            thumbnail_durability,
        })))
    }
}
