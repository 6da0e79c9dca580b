//! Bounded exponential backoff for transient API failures.

use crate::error::{EsignError, EsignResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy for calls against the e-signature service.
///
/// The wait interval is multiplied by [`multiplier`](Self::multiplier)
/// before every retry, so the first retry already waits
/// `base_delay * multiplier`. With the defaults (20s base, x3, 3 retries)
/// the schedule is 60s, 180s, 540s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt (0 disables retrying).
    pub max_retries: u32,
    /// Base wait interval the multiplier is applied to.
    pub base_delay: Duration,
    /// Backoff factor applied before each retry.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(20),
            multiplier: 3,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with explicit settings.
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_retries,
            base_delay,
            multiplier,
        }
    }

    /// Wait interval before the given retry (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(self.multiplier.saturating_pow(retry))
    }

    /// Run `operation` until it succeeds, fails permanently, or the retry
    /// budget runs out.
    ///
    /// Only errors classified retryable by
    /// [`EsignError::is_retryable`] are retried; everything else is
    /// returned to the caller immediately. Exhaustion is reported as
    /// [`EsignError::RetriesExhausted`] carrying the total attempt count.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> EsignResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EsignResult<T>>,
    {
        let mut retries: u32 = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    if retries > 0 {
                        debug!(
                            operation = operation_name,
                            attempts = retries + 1,
                            "succeeded after retrying"
                        );
                    }
                    return Ok(value);
                }
                Err(error) if error.is_retryable() => {
                    if retries >= self.max_retries {
                        warn!(
                            operation = operation_name,
                            attempts = retries + 1,
                            error = %error,
                            "retry budget exhausted"
                        );
                        return Err(EsignError::RetriesExhausted {
                            attempts: retries + 1,
                            message: format!("{operation_name}: {error}"),
                        });
                    }
                    retries += 1;
                    let delay = self.delay_for(retries);
                    warn!(
                        operation = operation_name,
                        attempt = retries,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "transient failure, waiting before retry"
                    );
                    sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1), 2)
    }

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(60));
        assert_eq!(policy.delay_for(2), Duration::from_secs(180));
        assert_eq!(policy.delay_for(3), Duration::from_secs(540));
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: EsignResult<u32> = fast_policy(3)
            .execute("op", || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: EsignResult<&str> = fast_policy(3)
            .execute("op", || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(EsignError::Server {
                            status: 503,
                            detail: "unavailable".to_string(),
                        })
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: EsignResult<()> = fast_policy(3)
            .execute("op", || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(EsignError::Rejected {
                        status: 404,
                        reason: "Not Found".to_string(),
                        headers: String::new(),
                    })
                }
            })
            .await;
        match result {
            Err(EsignError::Rejected { status: 404, .. }) => {}
            other => panic!("expected Rejected, got: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_total_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: EsignResult<()> = fast_policy(2)
            .execute("op", || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(EsignError::network("connection reset"))
                }
            })
            .await;
        match result {
            Err(EsignError::RetriesExhausted { attempts: 3, .. }) => {}
            other => panic!("expected RetriesExhausted, got: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_fails_after_one_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: EsignResult<()> = fast_policy(0)
            .execute("op", || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(EsignError::network("connection reset"))
                }
            })
            .await;
        match result {
            Err(EsignError::RetriesExhausted { attempts: 1, .. }) => {}
            other => panic!("expected RetriesExhausted, got: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
