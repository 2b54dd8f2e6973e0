use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::ProviderError;

/// Retry budget for rate-limited provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_RETRIES: u32 = 3;
    pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(1000);

    pub fn new(retries: u32, initial_backoff: Duration) -> Self {
        Self {
            retries,
            initial_backoff,
        }
    }

    /// Waits the policy would use if every attempt were rate limited.
    pub fn backoff_schedule(&self) -> Vec<Duration> {
        (0..self.retries)
            .map(|i| self.initial_backoff.saturating_mul(1 << i.min(31)))
            .collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RETRIES, Self::DEFAULT_BACKOFF)
    }
}

/// Waits between attempts. Swapped out in tests for something that does not
/// actually sleep.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Real wall-clock delay on the Tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Run `operation`, retrying only on rate-limit failures.
///
/// The backoff doubles after every wait. Any other error, or the error from
/// the last attempt once the budget is spent, is returned as is.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    delay: &dyn Delay,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut remaining = policy.retries;
    let mut backoff = policy.initial_backoff;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if remaining > 0 && err.is_rate_limited() => {
                warn!(
                    backoff_ms = backoff.as_millis() as u64,
                    retries_left = remaining,
                    "Rate limit hit, retrying"
                );
                delay.wait(backoff).await;
                backoff = backoff.saturating_mul(2);
                remaining -= 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Records requested waits instead of sleeping.
    #[derive(Default)]
    pub(crate) struct RecordingDelay {
        pub(crate) waits: Mutex<Vec<Duration>>,
    }

    impl RecordingDelay {
        pub(crate) fn waits(&self) -> Vec<Duration> {
            self.waits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn wait(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    fn rate_limited() -> ProviderError {
        ProviderError::with_status(429, "RESOURCE_EXHAUSTED")
    }

    #[test]
    fn default_schedule_doubles() {
        assert_eq!(
            RetryPolicy::default().backoff_schedule(),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000)
            ]
        );
    }

    #[tokio::test]
    async fn succeeds_after_two_rate_limits() {
        let delay = RecordingDelay::default();
        let calls = AtomicU32::new(0);

        let result = retry_with_backoff(RetryPolicy::default(), &delay, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(rate_limited())
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            delay.waits(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[tokio::test]
    async fn exhausted_budget_returns_original_error() {
        let delay = RecordingDelay::default();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry_with_backoff(RetryPolicy::default(), &delay, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Err(ProviderError::with_status(
                    429,
                    format!("quota exceeded on attempt {attempt}"),
                ))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            result,
            Err(ProviderError::with_status(429, "quota exceeded on attempt 3"))
        );
        assert_eq!(delay.waits(), RetryPolicy::default().backoff_schedule());
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let delay = RecordingDelay::default();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry_with_backoff(RetryPolicy::default(), &delay, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::with_status(500, "boom")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(delay.waits().is_empty());
        assert_eq!(result, Err(ProviderError::with_status(500, "boom")));
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let delay = RecordingDelay::default();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(0, Duration::from_millis(10));

        let result: Result<(), _> = retry_with_backoff(policy, &delay, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(rate_limited()) }
        })
        .await;

        assert!(result.unwrap_err().is_rate_limited());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(delay.waits().is_empty());
    }

    #[tokio::test]
    async fn tokio_delay_sleeps() {
        let start = tokio::time::Instant::now();
        TokioDelay.wait(Duration::from_millis(5)).await;
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
