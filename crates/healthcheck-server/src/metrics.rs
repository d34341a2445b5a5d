//! Prometheus metrics for healthcheck server.

use healthcheck::{HealthReport, Status};
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::time::Duration;

/// Labels for aggregate result metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StatusLabels {
    /// Status code (200, 503)
    pub status: String,
}

/// Labels for per-checker metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CheckerLabels {
    /// Registered checker name
    pub checker: String,
}

/// Metrics registry with all healthcheck server metrics
pub struct MetricsRegistry {
    /// Prometheus registry
    pub registry: Registry,

    /// Health check invocations by resulting status
    requests_total: Family<StatusLabels, Counter>,
    /// Failures per checker, fatal and observer alike
    check_failures_total: Family<CheckerLabels, Counter>,
    /// Wall time of one full fan-out
    duration_seconds: Histogram,
    /// Outcome of the latest invocation (1=ok, 0=unavailable)
    healthy: Gauge,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    /// Create a new metrics registry
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let requests_total = Family::<StatusLabels, Counter>::default();
        registry.register(
            "healthcheck_requests",
            "Total health check invocations by status",
            requests_total.clone(),
        );

        let check_failures_total = Family::<CheckerLabels, Counter>::default();
        registry.register(
            "healthcheck_check_failures",
            "Total failures reported per checker",
            check_failures_total.clone(),
        );

        // Exponential buckets from 1ms to ~16s
        let duration_seconds = Histogram::new(exponential_buckets(0.001, 2.0, 15));
        registry.register(
            "healthcheck_duration_seconds",
            "Duration of a complete health check in seconds",
            duration_seconds.clone(),
        );

        let healthy = Gauge::default();
        registry.register(
            "healthcheck_healthy",
            "Latest health check outcome (1=ok, 0=unavailable)",
            healthy.clone(),
        );

        Self {
            registry,
            requests_total,
            check_failures_total,
            duration_seconds,
            healthy,
        }
    }

    /// Record the outcome of one health check invocation
    pub fn record_report(&self, report: &HealthReport, elapsed: Duration) {
        self.requests_total
            .get_or_create(&StatusLabels {
                status: report.status.code().to_string(),
            })
            .inc();

        for name in report.errors.keys() {
            self.check_failures_total
                .get_or_create(&CheckerLabels {
                    checker: name.clone(),
                })
                .inc();
        }

        self.duration_seconds.observe(elapsed.as_secs_f64());
        self.healthy
            .set(if report.status == Status::Ok { 1 } else { 0 });
    }

    /// Encode all metrics in the Prometheus text format
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn report(status: Status, failed: &[&str]) -> HealthReport {
        HealthReport {
            status,
            errors: failed
                .iter()
                .map(|name| (name.to_string(), "connection refused".to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_record_healthy_report() {
        let metrics = MetricsRegistry::new();
        metrics.record_report(&report(Status::Ok, &[]), Duration::from_millis(5));

        let text = metrics.encode().unwrap();
        assert!(text.contains(r#"healthcheck_requests_total{status="200"} 1"#), "{}", text);
        assert!(text.contains("healthcheck_healthy 1"), "{}", text);
    }

    #[test]
    fn test_record_failures_per_checker() {
        let metrics = MetricsRegistry::new();
        metrics.record_report(
            &report(Status::Unavailable, &["database", "cache"]),
            Duration::from_millis(5),
        );
        metrics.record_report(
            &report(Status::Unavailable, &["database"]),
            Duration::from_millis(5),
        );

        let text = metrics.encode().unwrap();
        assert!(text.contains(r#"healthcheck_requests_total{status="503"} 2"#), "{}", text);
        assert!(
            text.contains(r#"healthcheck_check_failures_total{checker="database"} 2"#),
            "{}",
            text
        );
        assert!(
            text.contains(r#"healthcheck_check_failures_total{checker="cache"} 1"#),
            "{}",
            text
        );
        assert!(text.contains("healthcheck_healthy 0"), "{}", text);
    }
}
