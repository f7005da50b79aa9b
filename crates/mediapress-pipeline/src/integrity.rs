//! Integrity verification of received payloads.
//!
//! Confirms that the transport did not truncate the payload and that the
//! spooled on-disk copy agrees with the declared byte count, both directly
//! (metadata) and through a full re-read. Size probes are retried with a
//! short fixed delay to absorb filesystem propagation lag.

use std::path::Path;

use mediapress_core::{AppError, RetryPolicy};

/// Sizes may disagree by one byte without being treated as a mismatch.
pub const SIZE_TOLERANCE: u64 = 1;

/// Observed sizes for one payload. All three must converge.
#[derive(Clone, Copy, Debug)]
pub struct IntegrityRecord {
    pub declared: u64,
    pub on_disk: u64,
    pub buffered: u64,
    pub truncated: bool,
}

pub struct IntegrityVerifier {
    policy: RetryPolicy,
}

fn within_tolerance(a: u64, b: u64) -> bool {
    a.abs_diff(b) <= SIZE_TOLERANCE
}

impl IntegrityVerifier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Verify the spooled payload at `spooled` against `declared` bytes.
    ///
    /// The caller owns the temp file and removes it on every exit path;
    /// returning an error here must therefore never leave extra state behind.
    pub async fn verify(
        &self,
        declared: u64,
        spooled: &Path,
        data: &[u8],
    ) -> Result<IntegrityRecord, AppError> {
        let buffered = data.len() as u64;
        if !within_tolerance(declared, buffered) {
            tracing::warn!(
                declared,
                buffered,
                "Payload truncated in transit"
            );
            return Err(AppError::PayloadTruncated {
                declared,
                received: buffered,
            });
        }

        let on_disk = self
            .policy
            .run(|attempt| async move {
                let len = tokio::fs::metadata(spooled).await?.len();
                if within_tolerance(declared, len) {
                    Ok(len)
                } else {
                    tracing::debug!(attempt, declared, observed = len, "On-disk size not yet converged");
                    Err(AppError::IntegrityMismatch {
                        declared,
                        observed: len,
                    })
                }
            })
            .await?;

        // Metadata can agree while the content is still short; re-read fully.
        self.policy
            .run(|attempt| async move {
                let len = tokio::fs::read(spooled).await?.len() as u64;
                if within_tolerance(declared, len) {
                    Ok(len)
                } else {
                    tracing::debug!(attempt, declared, observed = len, "Re-read size not yet converged");
                    Err(AppError::IntegrityMismatch {
                        declared,
                        observed: len,
                    })
                }
            })
            .await?;

        Ok(IntegrityRecord {
            declared,
            on_disk,
            buffered,
            truncated: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn verifier() -> IntegrityVerifier {
        IntegrityVerifier::new(RetryPolicy::fixed(3, Duration::from_millis(5)))
    }

    fn spool(data: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn converging_sizes_pass() {
        let data = vec![7u8; 1024];
        let file = spool(&data);
        let record = verifier()
            .verify(1024, file.path(), &data)
            .await
            .unwrap();
        assert_eq!(record.on_disk, 1024);
        assert_eq!(record.buffered, 1024);
        assert!(!record.truncated);
    }

    #[tokio::test]
    async fn one_byte_difference_is_tolerated() {
        let data = vec![7u8; 1023];
        let file = spool(&data);
        assert!(verifier().verify(1024, file.path(), &data).await.is_ok());
    }

    #[tokio::test]
    async fn truncated_buffer_is_rejected() {
        let data = vec![7u8; 100];
        let file = spool(&data);
        let err = verifier().verify(1024, file.path(), &data).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::PayloadTruncated {
                declared: 1024,
                received: 100
            }
        ));
    }

    #[tokio::test]
    async fn short_on_disk_copy_is_rejected_after_retries() {
        let data = vec![7u8; 512];
        // Spool only half of the payload to force a persistent mismatch.
        let file = spool(&data[..256]);
        let err = verifier().verify(512, file.path(), &data).await.unwrap_err();
        assert!(matches!(err, AppError::IntegrityMismatch { observed: 256, .. }));
    }
}
