//! Cancellation, deadline and metric tags carried through every call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::Tags;

/// Why a [`RequestContext`] stopped a suspended operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ContextError {
    /// The context or one of its ancestors was cancelled.
    #[error("cancelled")]
    Cancelled,
    /// The context deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Caller-supplied scope for one distance or route call.
///
/// Every suspension point in this library (throttler waits, provider calls,
/// fan-out joins) runs under a context. Child contexts inherit the deadline
/// and tags, and are cancelled together with their parent; cancelling a
/// child leaves the parent untouched.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use waymark_core::RequestContext;
///
/// let ctx = RequestContext::new()
///     .with_timeout(Duration::from_secs(5))
///     .with_tag("region", "denver");
/// let group = ctx.child();
/// group.cancel();
/// assert!(group.is_cancelled());
/// assert!(!ctx.is_cancelled());
/// assert_eq!(group.tags().get("region").map(String::as_str), Some("denver"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    tags: Arc<Tags>,
}

impl RequestContext {
    /// A context with no deadline and no tags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tighten the deadline to `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Tighten the deadline; a later deadline than the current one is ignored.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(
            self.deadline
                .map_or(deadline, |current| current.min(deadline)),
        );
        self
    }

    /// Add a metric tag recorded by every measurement under this context.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.tags).insert(key.into(), value.into());
        self
    }

    /// Caller-supplied metric tags.
    #[must_use]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// A context cancelled whenever `self` is, sharing deadline and tags.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
            tags: Arc::clone(&self.tags),
        }
    }

    /// Cancel this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether this context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fail fast if the context has already ended.
    ///
    /// # Errors
    /// Returns the reason the context ended.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Err(ContextError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Resolve once the context ends, with the reason it ended.
    ///
    /// Cancellation wins over a deadline that passed at the same time.
    pub async fn ended(&self) -> ContextError {
        let deadline = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            biased;
            () = self.token.cancelled() => ContextError::Cancelled,
            () = deadline => ContextError::DeadlineExceeded,
        }
    }

    /// Drive `future` until it completes or the context ends.
    ///
    /// The context is checked before the future, so an already-ended
    /// context never polls it.
    ///
    /// # Errors
    /// Returns the reason the context ended first.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, ContextError>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            reason = self.ended() => Err(reason),
            output = future => Ok(output),
        }
    }
}
