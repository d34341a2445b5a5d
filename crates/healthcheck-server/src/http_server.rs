//! HTTP endpoints for health and Prometheus metrics.

use crate::metrics::MetricsRegistry;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use healthcheck::{CheckContext, HealthResponse, HealthService};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// State shared by the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<HealthService>,
    pub metrics: Option<Arc<MetricsRegistry>>,
}

/// Routes served by the health server
#[derive(Debug, Clone)]
pub struct Routes {
    pub health_path: String,
    pub metrics_path: Option<String>,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            health_path: "/health".to_string(),
            metrics_path: Some("/metrics".to_string()),
        }
    }
}

/// Build the router for the health and metrics endpoints
pub fn router(state: AppState, routes: &Routes) -> Router {
    let mut app = Router::new().route(&routes.health_path, get(health_handler));

    if let Some(path) = &routes.metrics_path {
        if state.metrics.is_some() {
            app = app.route(path, get(metrics_handler));
        }
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Handler for the health endpoint
async fn health_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let report = state
        .service
        .check_health(&CheckContext::background())
        .await;

    if let Some(metrics) = &state.metrics {
        metrics.record_report(&report, started.elapsed());
    }

    let code = StatusCode::from_u16(report.status.code()).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
    let body = match serde_json::to_string(&HealthResponse::from(report)) {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Failed to encode health response");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode health response: {}", e),
            )
                .into_response();
        }
    };

    (
        code,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        body,
    )
        .into_response()
}

/// Handler for the metrics endpoint
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let Some(registry) = state.metrics else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match registry.encode() {
        Ok(buffer) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            buffer,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}
