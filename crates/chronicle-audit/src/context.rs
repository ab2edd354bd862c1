//! Per-call execution context: cooperative cancellation plus an optional
//! deadline.
//!
//! Every repository and service operation takes a [`Context`]. Store calls
//! run under [`Context::run`], which gives up as soon as the token is
//! cancelled or the deadline passes.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{AuditError, AuditResult};

/// Cancellation and deadline carried through an operation.
///
/// Clones share the same token. [`child`](Self::child) derives a context
/// that is cancelled with its parent but can also be cancelled on its own.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now().checked_add(timeout).unwrap_or_else(far_future))
    }

    /// A context that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A context built around an existing token.
    #[must_use]
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A child context; cancelling the parent cancels the child.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// A child context whose deadline is the earlier of the parent's and
    /// `timeout` from now.
    #[must_use]
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let own = Instant::now().checked_add(timeout).unwrap_or_else(far_future);
        Self {
            token: self.token.child_token(),
            deadline: Some(self.deadline.map_or(own, |parent| parent.min(own))),
        }
    }

    /// Cancel this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether [`cancel`](Self::cancel) has been called here or on a parent.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The underlying token.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Fail fast if the context is already done.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Cancelled`] or [`AuditError::DeadlineExceeded`].
    pub fn check(&self, operation: &'static str) -> AuditResult<()> {
        if self.token.is_cancelled() {
            return Err(AuditError::Cancelled { operation });
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Err(AuditError::DeadlineExceeded { operation });
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context finishes first.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Cancelled`] or [`AuditError::DeadlineExceeded`]
    /// if the context finishes before `fut`; `fut` is dropped in that case.
    pub async fn run<F>(&self, operation: &'static str, fut: F) -> AuditResult<F::Output>
    where
        F: Future,
    {
        self.check(operation)?;
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(AuditError::Cancelled { operation }),
            () = expiry(self.deadline) => Err(AuditError::DeadlineExceeded { operation }),
            output = fut => Ok(output),
        }
    }

    /// Sleep for `duration`, waking early if the context finishes.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn sleep(&self, operation: &'static str, duration: Duration) -> AuditResult<()> {
        self.run(operation, tokio::time::sleep(duration)).await
    }
}

async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// Roughly 30 years; used when `now + timeout` overflows.
fn far_future() -> Instant {
    Instant::now()
        .checked_add(Duration::from_secs(946_080_000))
        .unwrap_or_else(Instant::now)
}
