//! Aggregation of fatal and observer checkers into one verdict.

use crate::checker::Checker;
use crate::context::CheckContext;
use crate::timeout::TimeoutChecker;
use crate::types::{CheckClass, HealthReport, Status};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Bound applied to every invocation unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs all registered checkers concurrently and reduces their outcomes.
///
/// Built once with [`HealthService::builder`]; the set of checkers cannot
/// change afterwards, so invocations only share per-call state.
pub struct HealthService {
    checkers: HashMap<String, Arc<dyn Checker>>,
    observers: HashMap<String, Arc<dyn Checker>>,
    timeout: Duration,
}

impl HealthService {
    pub fn builder() -> HealthServiceBuilder {
        HealthServiceBuilder::default()
    }

    /// Bound applied to each invocation; zero means only the caller's context applies
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of registered checkers, fatal and observer
    pub fn len(&self) -> usize {
        self.checkers.len() + self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the fatal checkers, in no particular order
    pub fn checker_names(&self) -> impl Iterator<Item = &str> {
        self.checkers.keys().map(String::as_str)
    }

    /// Names of the observer checkers, in no particular order
    pub fn observer_names(&self) -> impl Iterator<Item = &str> {
        self.observers.keys().map(String::as_str)
    }

    fn registrations(&self) -> impl Iterator<Item = (CheckClass, &String, &Arc<dyn Checker>)> {
        let fatal = self
            .checkers
            .iter()
            .map(|(name, checker)| (CheckClass::Fatal, name, checker));
        let observers = self
            .observers
            .iter()
            .map(|(name, checker)| (CheckClass::Observer, name, checker));
        fatal.chain(observers)
    }

    /// Run every checker and report the overall status.
    ///
    /// All checkers run to completion or until the effective deadline, the
    /// earlier of `ctx` and the configured timeout. A failing fatal checker
    /// makes the status [`Status::Unavailable`]; observer failures are only
    /// reported. Both appear in the error map under their registered name.
    pub async fn check_health(&self, ctx: &CheckContext) -> HealthReport {
        if self.is_empty() {
            return HealthReport::default();
        }

        // The bounded context is cancelled once this call returns.
        let (ctx, _guard) = if self.timeout > Duration::ZERO {
            let bounded = ctx.with_timeout(self.timeout);
            let guard = bounded.cancel_on_drop();
            (bounded, Some(guard))
        } else {
            (ctx.clone(), None)
        };

        let report = Arc::new(Mutex::new(HealthReport {
            status: Status::Ok,
            errors: HashMap::with_capacity(self.len()),
        }));

        let mut tasks = JoinSet::new();
        for (class, name, checker) in self.registrations() {
            let ctx = ctx.clone();
            let report = Arc::clone(&report);
            let checker = Arc::clone(checker);
            let name = name.clone();

            tasks.spawn(async move {
                if let Err(e) = checker.check(&ctx).await {
                    debug!(checker = %name, class = %class, error = %e, "Check failed");
                    let mut report = report.lock().await;
                    if class == CheckClass::Fatal {
                        report.status = Status::Unavailable;
                    }
                    report.errors.insert(name, e.to_string());
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Check task did not complete");
            }
        }

        let report = std::mem::take(&mut *report.lock().await);

        if report.is_ok() {
            debug!(failures = report.errors.len(), "Health check passed");
        } else {
            warn!(
                failures = report.errors.len(),
                status = %report.status,
                "Health check failed"
            );
        }

        report
    }
}

impl fmt::Debug for HealthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthService")
            .field("checkers", &self.checkers.keys().collect::<Vec<_>>())
            .field("observers", &self.observers.keys().collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Collects checkers before a [`HealthService`] is built.
pub struct HealthServiceBuilder {
    checkers: HashMap<String, Arc<dyn Checker>>,
    observers: HashMap<String, Arc<dyn Checker>>,
    timeout: Duration,
}

impl Default for HealthServiceBuilder {
    fn default() -> Self {
        Self {
            checkers: HashMap::new(),
            observers: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HealthServiceBuilder {
    /// Add a dependency whose failure makes the service unavailable
    pub fn with_checker(self, name: impl Into<String>, checker: impl Checker + 'static) -> Self {
        self.register(name, CheckClass::Fatal, checker)
    }

    /// Add a dependency whose failure is reported without failing the service
    pub fn with_observer(self, name: impl Into<String>, checker: impl Checker + 'static) -> Self {
        self.register(name, CheckClass::Observer, checker)
    }

    /// Add a checker of the given class, replacing one already registered
    /// under the same name in that class.
    pub fn register(
        mut self,
        name: impl Into<String>,
        class: CheckClass,
        checker: impl Checker + 'static,
    ) -> Self {
        let wrapped: Arc<dyn Checker> = Arc::new(TimeoutChecker::new(Arc::new(checker)));
        let bucket = match class {
            CheckClass::Fatal => &mut self.checkers,
            CheckClass::Observer => &mut self.observers,
        };
        bucket.insert(name.into(), wrapped);
        self
    }

    /// Bound for each invocation; `Duration::ZERO` relies on the caller's context alone
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> HealthService {
        HealthService {
            checkers: self.checkers,
            observers: self.observers,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{CheckError, checker_fn};

    #[test]
    fn test_builder_defaults() {
        let service = HealthService::builder().build();
        assert!(service.is_empty());
        assert_eq!(service.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_builder_registers_by_class() {
        let service = HealthService::builder()
            .with_checker("database", checker_fn(|_ctx| async { Ok(()) }))
            .with_observer("cache", checker_fn(|_ctx| async { Ok(()) }))
            .with_timeout(Duration::from_secs(1))
            .build();

        assert_eq!(service.len(), 2);
        assert_eq!(service.checker_names().collect::<Vec<_>>(), vec!["database"]);
        assert_eq!(service.observer_names().collect::<Vec<_>>(), vec!["cache"]);
        assert_eq!(service.timeout(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_reregistering_replaces_checker() {
        let service = HealthService::builder()
            .with_checker("database", checker_fn(|_ctx| async { Err(CheckError::failed("old")) }))
            .with_checker("database", checker_fn(|_ctx| async { Ok(()) }))
            .build();

        assert_eq!(service.len(), 1);
        let report = service.check_health(&CheckContext::background()).await;
        assert!(report.is_ok());
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_empty_service_is_ok() {
        let service = HealthService::builder().build();
        let (status, errors) = service
            .check_health(&CheckContext::background())
            .await
            .into_parts();
        assert_eq!(status, Status::Ok);
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_bounded_context_cancelled_after_return() {
        let (tx, rx) = tokio::sync::oneshot::channel::<CheckContext>();
        let tx = std::sync::Mutex::new(Some(tx));
        let service = HealthService::builder()
            .with_checker(
                "capture",
                checker_fn(move |ctx| {
                    if let Some(tx) = tx.lock().unwrap().take() {
                        let _ = tx.send(ctx);
                    }
                    async { Ok(()) }
                }),
            )
            .with_timeout(Duration::from_secs(60))
            .build();

        let caller = CheckContext::background();
        let report = service.check_health(&caller).await;
        assert!(report.is_ok());

        let seen = rx.await.unwrap();
        assert!(seen.is_done());
        assert!(!caller.is_done());
    }

    #[tokio::test]
    async fn test_report_includes_late_failures() {
        let service = HealthService::builder()
            .with_checker("fast", checker_fn(|_ctx| async { Err(CheckError::failed("fast")) }))
            .with_observer(
                "slow",
                checker_fn(|_ctx| async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Err(CheckError::failed("slow"))
                }),
            )
            .build();

        for _ in 0..3 {
            let report = service.check_health(&CheckContext::background()).await;
            assert_eq!(report.status, Status::Unavailable);
            assert_eq!(report.errors.len(), 2);
            assert_eq!(report.errors["slow"], "slow");
        }
    }
}
