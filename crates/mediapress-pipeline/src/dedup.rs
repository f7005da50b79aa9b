//! Content-addressed dedup index.
//!
//! Maps the SHA-256 fingerprint of accepted bytes to the URLs they were
//! committed under. A lookup hit lets the orchestrator skip transcoding and
//! storage entirely, making repeated uploads of the same bytes idempotent
//! with respect to storage side effects.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use mediapress_core::Clock;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the full payload: the deduplication key.
pub fn fingerprint(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Committed result for one fingerprint. Immutable after creation.
#[derive(Clone, Debug)]
pub struct DedupEntry {
    pub url: String,
    pub thumbnail_url: String,
    inserted_at: Instant,
}

pub struct DedupIndex {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, DedupEntry>>,
}

impl DedupIndex {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a fingerprint. Entries past their TTL are treated as misses
    /// even before the sweep removes them.
    pub fn lookup(&self, fingerprint: &str) -> Option<DedupEntry> {
        let now = self.clock.now();
        let entries = self.entries.lock().expect("dedup index poisoned");
        entries
            .get(fingerprint)
            .filter(|entry| now.duration_since(entry.inserted_at) <= self.ttl)
            .cloned()
    }

    /// Record a committed result. First write wins; entries are never updated.
    pub fn insert(&self, fingerprint: String, url: String, thumbnail_url: String) {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("dedup index poisoned");
        entries.entry(fingerprint).or_insert(DedupEntry {
            url,
            thumbnail_url,
            inserted_at: now,
        });
    }

    /// Remove expired entries. Returns the evicted count.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("dedup index poisoned");
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.inserted_at) <= self.ttl);
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted expired dedup entries");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("dedup index poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
