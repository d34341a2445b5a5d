//! Liveness and readiness aggregation for services.
//!
//! A [`HealthService`] fans out to any number of independent [`Checker`]s
//! (database connectivity, disk usage, downstream APIs), runs them
//! concurrently under a shared deadline and reduces the outcomes to one
//! [`Status`] plus a map of failure messages keyed by checker name.
//!
//! Checkers come in two classes:
//! - **fatal** checkers make the service unavailable when they fail
//! - **observer** checkers are reported but never change the status
//!
//! Every checker is wrapped in a [`TimeoutChecker`], so a check that ignores
//! its [`CheckContext`] still cannot hold up the aggregate result.
//!
//! # Example
//!
//! ```no_run
//! use healthcheck::{CheckContext, CheckError, HealthService, checker_fn, checkers::DiskSpace};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let service = HealthService::builder()
//!     .with_checker("database", checker_fn(|_ctx| async {
//!         Err(CheckError::failed("connection refused"))
//!     }))
//!     .with_observer("disk", DiskSpace::new("/var/lib", 90))
//!     .with_timeout(Duration::from_secs(5))
//!     .build();
//!
//! let report = service.check_health(&CheckContext::background()).await;
//! assert_eq!(report.status.code(), 503);
//! assert_eq!(report.errors["database"], "connection refused");
//! # }
//! ```

pub mod checker;
pub mod checkers;
pub mod context;
pub mod service;
pub mod timeout;
pub mod types;

pub use checker::{CheckError, Checker, CheckerFn, TIMEOUT_MESSAGE, checker_fn};
pub use context::CheckContext;
pub use service::{DEFAULT_TIMEOUT, HealthService, HealthServiceBuilder};
pub use timeout::TimeoutChecker;
pub use types::{CheckClass, HealthReport, HealthResponse, Status};
