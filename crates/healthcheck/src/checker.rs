//! The checker capability and its error type.

use crate::context::CheckContext;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Message reported for a check that did not finish before its deadline.
pub const TIMEOUT_MESSAGE: &str = "max check time exceeded";

/// Failure reported by a checker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// The check did not finish before the context was done.
    #[error("{}", TIMEOUT_MESSAGE)]
    Timeout,

    /// The dependency is not healthy.
    #[error("{0}")]
    Failed(String),
}

impl CheckError {
    /// Create a failure with the given description.
    pub fn failed(msg: impl Into<String>) -> Self {
        CheckError::Failed(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CheckError::Timeout)
    }
}

/// Checks the status of a single dependency.
///
/// Implementations return `Ok(())` when the dependency works as expected and
/// a [`CheckError`] describing the problem otherwise. A checker must never
/// panic to signal failure.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Evaluate the current status of the dependency.
    async fn check(&self, ctx: &CheckContext) -> Result<(), CheckError>;
}

#[async_trait]
impl<C: Checker + ?Sized> Checker for Arc<C> {
    async fn check(&self, ctx: &CheckContext) -> Result<(), CheckError> {
        (**self).check(ctx).await
    }
}

#[async_trait]
impl<C: Checker + ?Sized> Checker for Box<C> {
    async fn check(&self, ctx: &CheckContext) -> Result<(), CheckError> {
        (**self).check(ctx).await
    }
}

/// Adapter turning an async closure into a [`Checker`].
///
/// Created with [`checker_fn`].
#[derive(Clone)]
pub struct CheckerFn<F> {
    f: F,
}

/// Wrap `f` so it can be registered wherever a [`Checker`] is expected.
///
/// ```
/// use healthcheck::{CheckError, checker_fn};
///
/// let db = checker_fn(|_ctx| async { Err(CheckError::failed("connection refused")) });
/// # let _ = db;
/// ```
pub fn checker_fn<F, Fut>(f: F) -> CheckerFn<F>
where
    F: Fn(CheckContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CheckError>> + Send,
{
    CheckerFn { f }
}

#[async_trait]
impl<F, Fut> Checker for CheckerFn<F>
where
    F: Fn(CheckContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CheckError>> + Send,
{
    async fn check(&self, ctx: &CheckContext) -> Result<(), CheckError> {
        (self.f)(ctx.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(CheckError::Timeout.to_string(), TIMEOUT_MESSAGE);
        assert_eq!(
            CheckError::failed("connection refused").to_string(),
            "connection refused"
        );
        assert!(CheckError::Timeout.is_timeout());
        assert!(!CheckError::failed("x").is_timeout());
    }

    #[tokio::test]
    async fn test_checker_fn_passes_through() {
        let ok = checker_fn(|_ctx| async { Ok(()) });
        let failing = checker_fn(|_ctx| async { Err(CheckError::failed("connection refused")) });
        let ctx = CheckContext::background();

        assert_eq!(ok.check(&ctx).await, Ok(()));
        assert_eq!(
            failing.check(&ctx).await,
            Err(CheckError::failed("connection refused"))
        );
    }

    #[tokio::test]
    async fn test_checker_fn_sees_context() {
        let checker = checker_fn(|ctx: CheckContext| async move {
            if ctx.is_done() {
                Err(CheckError::Timeout)
            } else {
                Ok(())
            }
        });

        let ctx = CheckContext::background().child();
        ctx.cancel();
        assert_eq!(checker.check(&ctx).await, Err(CheckError::Timeout));
    }

    #[tokio::test]
    async fn test_dyn_checker_through_arc() {
        let checker: Arc<dyn Checker> = Arc::new(checker_fn(|_ctx| async { Ok(()) }));
        assert!(checker.check(&CheckContext::background()).await.is_ok());
    }
}
