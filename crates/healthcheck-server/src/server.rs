//! Main healthcheck server implementation.

use crate::config::Config;
use crate::http_server::{AppState, Routes, router};
use crate::metrics::MetricsRegistry;
use common::Result;
use healthcheck::HealthService;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Serves the aggregated health of the configured checks over HTTP
pub struct HealthServer {
    listen_addr: String,
    routes: Routes,
    state: AppState,
}

impl HealthServer {
    /// Create a server for an already built health service
    pub fn new(listen_addr: impl Into<String>, routes: Routes, service: HealthService) -> Self {
        let metrics = routes
            .metrics_path
            .as_ref()
            .map(|_| Arc::new(MetricsRegistry::new()));
        Self {
            listen_addr: listen_addr.into(),
            routes,
            state: AppState {
                service: Arc::new(service),
                metrics,
            },
        }
    }

    /// Create a server from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        let routes = Routes {
            health_path: config.server.health_path.clone(),
            metrics_path: config
                .metrics
                .enabled
                .then(|| config.metrics.path.clone()),
        };
        Self::new(
            config.server.listen_addr.clone(),
            routes,
            config.build_service(),
        )
    }

    pub fn service(&self) -> &HealthService {
        &self.state.service
    }

    /// Run the server until the listener fails
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.listen_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!(
            listen_addr = %local_addr,
            health_path = %self.routes.health_path,
            metrics = self.state.metrics.is_some(),
            checkers = self.state.service.len(),
            timeout_ms = self.state.service.timeout().as_millis() as u64,
            "Health server listening"
        );

        let app = router(self.state, &self.routes);
        axum::serve(listener, app).await?;

        info!("Health server stopped");
        Ok(())
    }
}
