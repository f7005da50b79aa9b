//! Retry with backoff.
//!
//! One parameterized combinator covers every stage that tolerates transient
//! failure: integrity size checks use a fixed short delay, verification
//! polling uses exponential backoff. Jitter is optional and off by default.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

#[derive(Clone, Copy, Debug)]
pub enum Backoff {
    Fixed,
    Exponential,
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    backoff: Backoff,
    max_attempts: usize,
    base_delay: Duration,
    max_delay: Option<Duration>,
    jitter_fraction: f64,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: usize, base_delay: Duration) -> Self {
        Self::new(Backoff::Fixed, max_attempts, base_delay)
    }

    pub fn exponential(max_attempts: usize, base_delay: Duration) -> Self {
        Self::new(Backoff::Exponential, max_attempts, base_delay)
    }

    fn new(backoff: Backoff, max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            backoff,
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: None,
            jitter_fraction: 0.0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = if max_delay.is_zero() {
            None
        } else {
            Some(max_delay)
        };
        self
    }

    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction.max(0.0);
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay to sleep after a failed attempt (1-based) before the next one.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let raw = match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential => {
                let shift = attempt.saturating_sub(1).min(31);
                let factor = 1u128 << shift;
                let scaled = self.base_delay.as_millis().saturating_mul(factor);
                Duration::from_millis(scaled.min(u128::from(u64::MAX)) as u64)
            }
        };
        let bounded = match self.max_delay {
            Some(max) => raw.min(max),
            None => raw,
        };
        if bounded.is_zero() || self.jitter_fraction <= 0.0 {
            bounded
        } else {
            let jitter = self.jitter_fraction.min(1.0);
            let factor = rand::rng().random_range((1.0 - jitter)..=(1.0 + jitter));
            let millis = bounded.as_millis() as f64;
            Duration::from_millis((millis * factor).round().max(0.0) as u64)
        }
    }

    /// Run `op` until it succeeds or the attempt budget is exhausted, sleeping
    /// the per-attempt delay between failures. The closure receives the
    /// 1-based attempt number; the last error is returned on exhaustion.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.max_attempts => return Err(err),
                Err(_) => {
                    tokio::time::sleep(self.delay_for_attempt(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
