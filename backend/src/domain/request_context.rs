//! Caller-supplied cancellation scope for operations that wait on I/O.
//!
//! A [`RequestContext`] combines an explicit cancellation signal with an
//! optional deadline. Operations that block on an external acknowledgement
//! race their wait against [`RequestContext::done`] so a caller timeout
//! unblocks them immediately.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context stopped accepting work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context was cancelled explicitly.
    #[error("context cancelled")]
    Cancelled,
    /// The context deadline elapsed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token plus optional deadline.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use walk_backend::domain::{ContextError, RequestContext};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let ctx = RequestContext::with_timeout(Duration::from_millis(1));
/// assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}

impl RequestContext {
    /// A context that only ends when cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derive a context cancelled with this one and bounded by `timeout`.
    ///
    /// The child keeps the earlier of the two deadlines. Cancelling the
    /// child does not cancel the parent.
    #[must_use]
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancel this context and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Deadline, if one applies.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Return the reason the context ended, or `None` while it is live.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Return `true` once the context is cancelled or past its deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolve once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    () = self.token.cancelled() => ContextError::Cancelled,
                    () = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ContextError::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn background_context_is_live_until_cancelled() {
        let ctx = RequestContext::background();
        assert_eq!(ctx.err(), None);

        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
        assert_eq!(ctx.done().await, ContextError::Cancelled);
    }

    #[rstest]
    #[tokio::test]
    async fn timeout_context_reports_deadline_exceeded() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(1));
        assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[rstest]
    #[tokio::test]
    async fn child_inherits_parent_cancellation() {
        let parent = RequestContext::background();
        let child = parent.child_with_timeout(Duration::from_secs(60));

        parent.cancel();
        assert_eq!(child.done().await, ContextError::Cancelled);
    }

    #[rstest]
    fn child_keeps_the_earlier_deadline() {
        let parent = RequestContext::with_timeout(Duration::from_millis(10));
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[rstest]
    #[tokio::test]
    async fn cancelling_child_leaves_parent_live() {
        let parent = RequestContext::background();
        let child = parent.child_with_timeout(Duration::from_secs(60));

        child.cancel();
        assert_eq!(child.err(), Some(ContextError::Cancelled));
        assert_eq!(parent.err(), None);
    }
}
