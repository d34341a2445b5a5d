//! Deadline enforcement for checkers that may ignore their context.

use crate::checker::{CheckError, Checker};
use crate::context::CheckContext;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Bounds a checker by its context, whether or not the checker cooperates.
///
/// The wrapped check runs as its own tokio task. Whichever comes first, the
/// task finishing or the context being done, decides the result.
///
/// When the context wins, the inner task is detached, not aborted: it keeps
/// running until it returns on its own and its result is discarded. A checker
/// that hangs forever therefore leaks one task per invocation. Checkers that
/// watch [`CheckContext::done`] can stop early, since the context they see is
/// the one that expired.
pub struct TimeoutChecker {
    inner: Arc<dyn Checker>,
}

impl TimeoutChecker {
    pub fn new(inner: Arc<dyn Checker>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Checker for TimeoutChecker {
    async fn check(&self, ctx: &CheckContext) -> Result<(), CheckError> {
        let inner = Arc::clone(&self.inner);
        let task_ctx = ctx.clone();
        let mut handle = tokio::spawn(async move { inner.check(&task_ctx).await });

        tokio::select! {
            // Polled first so an already expired context always reports a timeout.
            biased;

            _ = ctx.done() => {
                debug!("check abandoned after context was done");
                Err(CheckError::Timeout)
            }
            joined = &mut handle => match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "check task did not complete");
                    Err(CheckError::failed(format!("check panicked: {}", e)))
                }
            },
        }
    }
}
