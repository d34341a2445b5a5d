//! Deadline and cancellation signal handed to every checker.

use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Cancellation and deadline signal for a single health check invocation.
///
/// Contexts form a tree: a child derived with [`CheckContext::with_timeout`]
/// or [`CheckContext::child`] is cancelled whenever its parent is, and its
/// deadline is never later than the parent's. Cancelling a child never
/// affects the parent.
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CheckContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a child context that also expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context that also expires at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child context that can be cancelled independently.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and all contexts derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns a guard that cancels this context when dropped.
    pub fn cancel_on_drop(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    /// The point in time after which this context is done, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the context has been cancelled or its deadline has passed.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Completes once the context is cancelled or its deadline passes.
    ///
    /// Never completes for a context without a deadline that is never cancelled.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test]
    async fn test_background_never_done() {
        let ctx = CheckContext::background();
        assert!(!ctx.is_done());
        assert!(ctx.deadline().is_none());

        let mut done = task::spawn(ctx.done());
        assert_pending!(done.poll());
    }

    #[tokio::test]
    async fn test_cancel_propagates_to_children_only() {
        let parent = CheckContext::background();
        let child = parent.child();
        let grandchild = child.with_timeout(Duration::from_secs(60));

        child.cancel();

        assert!(child.is_done());
        assert!(grandchild.is_done());
        assert!(!parent.is_done());

        let mut done = task::spawn(grandchild.done());
        assert_ready!(done.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let ctx = CheckContext::background().with_timeout(Duration::from_millis(50));
        assert!(!ctx.is_done());

        ctx.done().await;
        assert!(ctx.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_deadline_never_extends_parent() {
        let parent = CheckContext::background().with_timeout(Duration::from_millis(10));
        let child = parent.with_timeout(Duration::from_secs(10));

        assert_eq!(child.deadline(), parent.deadline());

        let narrower = parent.with_timeout(Duration::from_millis(1));
        assert!(narrower.deadline() < parent.deadline());
    }

    #[tokio::test]
    async fn test_drop_guard_cancels() {
        let ctx = CheckContext::background().child();
        {
            let _guard = ctx.cancel_on_drop();
            assert!(!ctx.is_done());
        }
        assert!(ctx.is_done());
    }
}
