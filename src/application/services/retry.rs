//! # Retry Policy
//!
//! Bounded retry with exponential backoff for remote calls.
//!
//! Only errors that report themselves as transient through [`Retryable`]
//! are retried. A permanent error ends the loop on the attempt that raised
//! it. The outcome is a plain `Result`: the value, or a [`RetryFailure`]
//! carrying the attempt count and the last error.
//!
//! # Examples
//!
//! ```
//! use portfolio_derivations::application::services::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3, Duration::from_millis(200), Duration::from_secs(2));
//! assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
//! assert_eq!(policy.backoff_for(2), Duration::from_millis(400));
//! assert_eq!(policy.backoff_for(6), Duration::from_secs(2));
//! ```

use crate::infrastructure::fx::FxProviderError;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Default number of attempts, including the first call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// Default upper bound for a single delay.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(2);

/// Errors that know whether a retry may help.
pub trait Retryable {
    /// Returns true if the failed operation may succeed when repeated.
    fn is_retryable(&self) -> bool;

    /// Minimum delay requested by the remote side, if any.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl Retryable for FxProviderError {
    fn is_retryable(&self) -> bool {
        FxProviderError::is_retryable(self)
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_after_ms().map(Duration::from_millis)
    }
}

/// Terminal failure of a retried operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure<E> {
    /// Number of attempts made.
    pub attempts: u32,
    /// Error returned by the last attempt.
    pub last_error: E,
}

impl<E: fmt::Display> fmt::Display for RetryFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed after {} attempt(s): {}",
            self.attempts, self.last_error
        )
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryFailure<E> {}

/// Bounded exponential backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            DEFAULT_INITIAL_BACKOFF,
            DEFAULT_MAX_BACKOFF,
        )
    }
}

impl RetryPolicy {
    /// Creates a policy.
    ///
    /// `max_attempts` counts the first call and is raised to at least one.
    /// `max_backoff` is raised to at least `initial_backoff`.
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff: max_backoff.max(initial_backoff),
        }
    }

    /// A policy that makes exactly one attempt.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Maximum number of attempts.
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the first retry.
    #[inline]
    #[must_use]
    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    /// Upper bound for a single delay.
    #[inline]
    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Delay before retry number `retry` (1-based), doubling each time.
    #[must_use]
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1_u32 << shift)
            .min(self.max_backoff)
    }

    /// Runs `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent.
    ///
    /// `operation` receives the 1-based attempt number. A `retry_after` hint
    /// on the error lengthens the next delay, still capped by `max_backoff`.
    ///
    /// # Errors
    ///
    /// Returns [`RetryFailure`] with the last error if no attempt succeeded.
    pub async fn execute<T, E, F, Fut>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, RetryFailure<E>>
    where
        E: Retryable + fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(operation = operation_name, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) if error.is_retryable() && attempt < self.max_attempts => {
                    let delay = error
                        .retry_after()
                        .map_or_else(|| self.backoff_for(attempt), |hint| {
                            hint.max(self.backoff_for(attempt))
                        })
                        .min(self.max_backoff);
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        retryable = error.is_retryable(),
                        error = %error,
                        "giving up"
                    );
                    return Err(RetryFailure {
                        attempts: attempt,
                        last_error: error,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(2))
    }

    mod backoff {
        use super::*;

        #[test]
        fn doubles_until_cap() {
            let policy = RetryPolicy::default();
            assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
            assert_eq!(policy.backoff_for(2), Duration::from_millis(400));
            assert_eq!(policy.backoff_for(3), Duration::from_millis(800));
            assert_eq!(policy.backoff_for(4), Duration::from_millis(1600));
            assert_eq!(policy.backoff_for(5), Duration::from_secs(2));
            assert_eq!(policy.backoff_for(u32::MAX), Duration::from_secs(2));
        }

        #[test]
        fn attempts_are_at_least_one() {
            assert_eq!(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO).max_attempts(), 1);
            assert_eq!(RetryPolicy::no_retry().max_attempts(), 1);
        }

        #[test]
        fn max_backoff_not_below_initial() {
            let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_millis(10));
            assert_eq!(policy.max_backoff(), Duration::from_secs(1));
        }
    }

    mod execute {
        use super::*;

        #[tokio::test]
        async fn first_success_makes_one_call() {
            let calls = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&calls);
            let result: Result<u32, RetryFailure<FxProviderError>> = fast_policy(3)
                .execute("test", |attempt| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async move { Ok(attempt) }
                })
                .await;
            assert_eq!(result.unwrap(), 1);
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn transient_errors_are_retried() {
            let result = fast_policy(3)
                .execute("test", |attempt| async move {
                    if attempt < 3 {
                        Err(FxProviderError::connection("reset"))
                    } else {
                        Ok("rates")
                    }
                })
                .await;
            assert_eq!(result.unwrap(), "rates");
        }

        #[tokio::test]
        async fn exhaustion_reports_attempts_and_last_error() {
            let failure = fast_policy(3)
                .execute("test", |attempt| async move {
                    Err::<(), _>(FxProviderError::timeout(format!("attempt {attempt}")))
                })
                .await
                .unwrap_err();
            assert_eq!(failure.attempts, 3);
            assert!(failure.last_error.to_string().contains("attempt 3"));
        }

        #[tokio::test]
        async fn permanent_error_stops_immediately() {
            let calls = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&calls);
            let failure = fast_policy(5)
                .execute("test", |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(FxProviderError::authentication("bad key")) }
                })
                .await
                .unwrap_err();
            assert_eq!(failure.attempts, 1);
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn retry_after_hint_is_capped() {
            let policy = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(5));
            let started = std::time::Instant::now();
            let failure = policy
                .execute("test", |_| async {
                    Err::<(), _>(FxProviderError::rate_limited_with_retry("slow down", 60_000))
                })
                .await
                .unwrap_err();
            assert_eq!(failure.attempts, 2);
            assert!(started.elapsed() < Duration::from_secs(5));
        }
    }
}
