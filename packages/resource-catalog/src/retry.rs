//! Backoff for backend throttling.
//!
//! Only an explicit "too many requests" signal is retried. Every other error
//! is returned immediately so the loader can fall through to the next
//! strategy.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::error::{SourceError, SourceResult};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 500;
const DEFAULT_MAX_DELAY_MS: u64 = 8_000;

/// How often and how long to back off when a backend throttles us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = never retry)
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each following retry
    pub base_delay: Duration,

    /// Upper bound for any single delay, including server-provided ones
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Retry without sleeping. Meant for tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Set the retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Delay before retry number `retry` (1-based).
    ///
    /// A server-provided `Retry-After` wins over the exponential schedule;
    /// both are capped at `max_delay`.
    pub fn delay_for(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)));
        retry_after.unwrap_or(exponential).min(self.max_delay)
    }
}

/// Outcome of [`retry_rate_limited`]: the final result plus attempts made.
#[derive(Debug)]
pub struct Retried<T> {
    pub result: SourceResult<T>,
    pub attempts: u32,
}

/// Run `op`, retrying with backoff while it reports [`SourceError::RateLimited`].
pub async fn retry_rate_limited<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Retried<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SourceResult<T>>,
{
    let mut attempts = 0;

    loop {
        attempts += 1;
        match op().await {
            Err(SourceError::RateLimited { retry_after }) if attempts <= policy.max_retries => {
                let delay = policy.delay_for(attempts, retry_after);
                warn!(
                    strategy = label,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Backend throttled request, backing off"
                );
                if !delay.is_zero() {
                    sleep(delay).await;
                }
            }
            result => return Retried { result, attempts },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_delays_are_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1, None), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2, None), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3, None), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(10, None), Duration::from_millis(8000));
    }

    #[test]
    fn test_retry_after_wins_but_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(60))),
            Duration::from_secs(8)
        );
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let outcome = retry_rate_limited(&RetryPolicy::immediate(3), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(SourceError::RateLimited { retry_after: None })
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(outcome.result.unwrap(), 2);
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let outcome: Retried<()> = retry_rate_limited(&RetryPolicy::immediate(2), "test", || async {
            Err(SourceError::RateLimited { retry_after: None })
        })
        .await;

        assert!(matches!(outcome.result, Err(SourceError::RateLimited { .. })));
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let outcome: Retried<()> = retry_rate_limited(&RetryPolicy::immediate(5), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(SourceError::Api {
                    status: 500,
                    message: "down".into(),
                })
            }
        })
        .await;

        assert!(matches!(outcome.result, Err(SourceError::Api { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
