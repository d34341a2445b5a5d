//! HTTP front end for the healthcheck aggregator.
//!
//! Loads checks from YAML, builds a [`healthcheck::HealthService`] and
//! serves its verdict over HTTP:
//! - `GET /health` answers 200 or 503 with `{"status": ..., "errors": {...}}`
//! - `GET /metrics` exposes Prometheus metrics about past invocations

pub mod config;
pub mod http_server;
pub mod metrics;
pub mod server;

pub use config::{CheckKind, CheckSettings, Config, ConfigError};
pub use http_server::{AppState, Routes, router};
pub use metrics::MetricsRegistry;
pub use server::HealthServer;
