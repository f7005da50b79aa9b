//! Mediapress Ingestion Pipeline
//!
//! The media ingestion pipeline: admission control, integrity verification,
//! signature scanning, content-addressed deduplication, image transcoding,
//! storage routing and durable commit with write-verification.
//!
//! Control flow for one request, sequenced by the orchestrator:
//! admission acquire → integrity → signature scan → dedup lookup
//! (short-circuit on hit) → classify/transcode → route → commit →
//! dedup insert → admission release. Temporary resources are released on
//! every exit path.

pub mod admission;
pub mod dedup;
pub mod executor;
pub mod integrity;
pub mod media;
pub mod orchestrator;
pub mod router;
pub mod scanner;
pub mod sweeper;

pub use admission::{AdmissionGate, AdmissionSlot, SlotGuard};
pub use dedup::{fingerprint, DedupEntry, DedupIndex};
pub use executor::UploadExecutor;
pub use integrity::{IntegrityRecord, IntegrityVerifier};
pub use media::{MediaClassifier, MediaPolicy};
pub use orchestrator::{IngestOutcome, IngestPipeline, StoredMedia};
pub use router::{RoutedTargets, StorageRouter};
pub use scanner::{scan, SecurityVerdict};
pub use sweeper::Sweeper;
