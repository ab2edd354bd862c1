//! Fixed-delay retry for transient store failures.
//!
//! Only writes are retried. Each attempt runs under the caller's
//! [`Context`], and so does the pause between attempts, so cancellation
//! stops the loop immediately instead of burning the remaining attempts.

use std::future::Future;
use std::time::Duration;

use chronicle_config::StoreConfig;
use tracing::warn;

use crate::context::Context;
use crate::error::AuditResult;

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = a single attempt).
    pub max_retries: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a new retry policy.
    #[must_use]
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A single attempt, no retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// The policy described by a store configuration.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }

    /// Total number of attempts, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

/// Result of a retried operation that was not interrupted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    /// An attempt succeeded.
    Success {
        /// The value produced.
        value: T,
        /// Attempts made, including the successful one.
        attempts: u32,
    },
    /// Every attempt failed.
    Exhausted {
        /// The error from the last attempt.
        error: E,
        /// Total attempts made.
        attempts: u32,
    },
}

impl<T, E> RetryOutcome<T, E> {
    /// Returns true if an attempt succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Number of attempts made.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Run `operation` until it succeeds or `policy` runs out of attempts.
///
/// `operation` receives the 1-based attempt number. Between failed attempts
/// the loop sleeps for `policy.delay`.
///
/// # Errors
///
/// Returns [`AuditError::Cancelled`](crate::AuditError::Cancelled) or
/// [`AuditError::DeadlineExceeded`](crate::AuditError::DeadlineExceeded) if
/// `ctx` finishes during an attempt or a pause. Operation failures are
/// reported through [`RetryOutcome::Exhausted`], not as `Err`.
pub async fn retry<T, E, F, Fut>(
    ctx: &Context,
    policy: &RetryPolicy,
    operation: &'static str,
    mut attempt_fn: F,
) -> AuditResult<RetryOutcome<T, E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts();
    let mut attempt: u32 = 0;

    loop {
        attempt = attempt.saturating_add(1);
        ctx.check(operation)?;
        match ctx.run(operation, attempt_fn(attempt)).await? {
            Ok(value) => {
                return Ok(RetryOutcome::Success {
                    value,
                    attempts: attempt,
                });
            },
            Err(error) if attempt >= max_attempts => {
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    error = %error,
                    "giving up after final attempt"
                );
                return Ok(RetryOutcome::Exhausted {
                    error,
                    attempts: attempt,
                });
            },
            Err(error) => {
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    error = %error,
                    delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
                    "attempt failed, retrying"
                );
                ctx.sleep(operation, policy.delay).await?;
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::AuditError;

    fn failing_until(
        succeed_on: u32,
        calls: &Arc<AtomicU32>,
    ) -> impl FnMut(u32) -> std::future::Ready<Result<u32, String>> {
        let calls = Arc::clone(calls);
        move |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if attempt >= succeed_on {
                Ok(attempt)
            } else {
                Err(format!("attempt {attempt} failed"))
            })
        }
    }

    #[test]
    fn test_policy_attempts() {
        assert_eq!(RetryPolicy::no_retry().max_attempts(), 1);
        assert_eq!(RetryPolicy::default().max_attempts(), 4);
        assert_eq!(RetryPolicy::default().delay, Duration::from_secs(1));
        assert_eq!(
            RetryPolicy::new(u32::MAX, Duration::ZERO).max_attempts(),
            u32::MAX
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_last_allowed_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let outcome = retry(
            &Context::background(),
            &policy,
            "insert",
            failing_until(4, &calls),
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            RetryOutcome::Success {
                value: 4,
                attempts: 4
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_every_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(2, Duration::from_millis(100));
        let outcome = retry(
            &Context::background(),
            &policy,
            "insert",
            failing_until(u32::MAX, &calls),
        )
        .await
        .unwrap();

        assert!(!outcome.is_success());
        assert_eq!(outcome.attempts(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match outcome {
            RetryOutcome::Exhausted { error, .. } => assert_eq!(error, "attempt 3 failed"),
            RetryOutcome::Success { .. } => panic!("expected exhaustion"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_fixed() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_millis(250));
        let start = tokio::time::Instant::now();
        retry(
            &Context::background(),
            &policy,
            "insert",
            failing_until(u32::MAX, &calls),
        )
        .await
        .unwrap();
        // Three pauses between four attempts, no growth.
        assert_eq!(start.elapsed(), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_stops_retrying() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(10, Duration::from_secs(1));
        let ctx = Context::with_timeout(Duration::from_millis(1500));
        let err = retry(&ctx, &policy, "insert", failing_until(u32::MAX, &calls))
            .await
            .unwrap_err();

        assert!(matches!(err, AuditError::DeadlineExceeded { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_context_makes_no_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let ctx = Context::background();
        ctx.cancel();
        let err = retry(
            &ctx,
            &RetryPolicy::default(),
            "insert",
            failing_until(1, &calls),
        )
        .await
        .unwrap_err();

        assert!(err.is_cancellation());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
