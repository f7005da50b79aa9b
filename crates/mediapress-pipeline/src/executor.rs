//! Upload executor: writes objects and confirms durability.
//!
//! Writes happen exactly once per target (blind write retries would risk
//! duplicate-object costs). Durability is then confirmed by HEAD-style
//! polling with increasing backoff; an eventually-consistent backend that
//! never acknowledges within the budget yields a soft success, not an error.

use std::time::Instant;

use mediapress_core::models::{CommitResult, Durability, StorageTarget};
use mediapress_core::{AppError, RetryPolicy};
use mediapress_storage::Storage;

pub struct UploadExecutor {
    verify_policy: RetryPolicy,
}

impl UploadExecutor {
    pub fn new(verify_policy: RetryPolicy) -> Self {
        Self { verify_policy }
    }

    /// Write one target and poll for durability confirmation.
    pub async fn commit(
        &self,
        storage: &dyn Storage,
        target: &StorageTarget,
        data: Vec<u8>,
    ) -> Result<CommitResult, AppError> {
        let expected = data.len() as u64;
        let start = Instant::now();

        let url = storage
            .put(&target.key, &target.content_type, data)
            .await
            .map_err(|e| AppError::StorageBackendUnavailable(e.to_string()))?;

        let durability = self.poll_verification(storage, &target.key, expected).await;

        match durability {
            Durability::Confirmed => {
                tracing::info!(
                    key = %target.key,
                    size_bytes = expected,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Commit verified"
                );
            }
            Durability::Unconfirmed => {
                tracing::warn!(
                    key = %target.key,
                    size_bytes = expected,
                    attempts = self.verify_policy.max_attempts(),
                    "Commit accepted but durability unconfirmed within polling budget"
                );
            }
        }

        Ok(CommitResult {
            url,
            key: target.key.clone(),
            durability,
        })
    }

    async fn poll_verification(
        &self,
        storage: &dyn Storage,
        key: &str,
        expected: u64,
    ) -> Durability {
        let outcome: Result<(), String> = self
            .verify_policy
            .run(|attempt| async move {
                tracing::debug!(attempt, key, "Verifying stored object");
                match storage.exists(key).await {
                    Ok(true) => match storage.content_length(key).await {
                        Ok(len) if len == expected => Ok(()),
                        Ok(len) => Err(format!("size mismatch: expected {}, found {}", expected, len)),
                        Err(e) => Err(e.to_string()),
                    },
                    Ok(false) => Err("object not yet visible".to_string()),
                    Err(e) => Err(e.to_string()),
                }
            })
            .await;

        match outcome {
            Ok(()) => Durability::Confirmed,
            Err(reason) => {
                tracing::debug!(key, %reason, "Verification polling exhausted");
                Durability::Unconfirmed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mediapress_core::models::BackendChoice;
    use mediapress_core::StorageBackend;
    use mediapress_storage::{LocalStorage, StorageError, StorageResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn target(key: &str) -> StorageTarget {
        StorageTarget {
            backend: BackendChoice::Primary,
            key: key.to_string(),
            content_type: "image/png".to_string(),
        }
    }

    fn executor(attempts: usize) -> UploadExecutor {
        UploadExecutor::new(RetryPolicy::exponential(
            attempts,
            Duration::from_millis(1),
        ))
    }

    /// Backend whose objects become visible only after a number of probes,
    /// mimicking an eventually-consistent store.
    struct LaggingStorage {
        objects: Mutex<HashMap<String, u64>>,
        visible_after_probes: usize,
        probes: AtomicUsize,
    }

    impl LaggingStorage {
        fn new(visible_after_probes: usize) -> Self {
            Self {
                objects: Mutex::new(HashMap::new()),
                visible_after_probes,
                probes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Storage for LaggingStorage {
        async fn put(&self, key: &str, _content_type: &str, data: Vec<u8>) -> StorageResult<String> {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), data.len() as u64);
            Ok(format!("http://lagging/{}", key))
        }

        async fn exists(&self, key: &str) -> StorageResult<bool> {
            let seen = self.probes.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(seen >= self.visible_after_probes
                && self.objects.lock().unwrap().contains_key(key))
        }

        async fn content_length(&self, key: &str) -> StorageResult<u64> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .copied()
                .ok_or_else(|| StorageError::NotFound(key.to_string()))
        }

        async fn delete(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }

        async fn presigned_put_url(
            &self,
            _key: &str,
            _content_type: &str,
            _expires_in: Duration,
        ) -> StorageResult<String> {
            Err(StorageError::ConfigError("unsupported".to_string()))
        }

        fn public_url(&self, key: &str) -> String {
            format!("http://lagging/{}", key)
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Local
        }
    }

    #[tokio::test]
    async fn commit_against_local_storage_is_confirmed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost/media".to_string())
            .await
            .unwrap();

        let result = executor(3)
            .commit(&storage, &target("blog/1-0000-a.png"), vec![9u8; 64])
            .await
            .unwrap();

        assert_eq!(result.durability, Durability::Confirmed);
        assert_eq!(result.url, "http://localhost/media/blog/1-0000-a.png");
    }

    #[tokio::test]
    async fn eventual_visibility_is_confirmed_within_budget() {
        let storage = LaggingStorage::new(3);
        let result = executor(5)
            .commit(&storage, &target("a/b.png"), vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(result.durability, Durability::Confirmed);
    }

    #[tokio::test]
    async fn exhausted_polling_is_soft_success() {
        // Never becomes visible within the 2-attempt budget.
        let storage = LaggingStorage::new(100);
        let result = executor(2)
            .commit(&storage, &target("a/b.png"), vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(result.durability, Durability::Unconfirmed);
        assert!(result.url.contains("a/b.png"));
    }
}
