pub mod handlers;
pub mod models;
pub mod page;
pub mod router;

use crate::config::Config;
use crate::report::Reporter;
use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use std::net::SocketAddr;
use std::sync::Arc;

pub struct ApiServer {
    reporter: Arc<Reporter>,
}

impl ApiServer {
    /// Wraps the reporter in an Arc for shared handler access.
    pub fn new(reporter: Reporter) -> Self {
        Self {
            reporter: Arc::new(reporter),
        }
    }

    /// Binds the server to the configured port and serves until Ctrl+C.
    pub async fn run(self, config: &Config) -> anyhow::Result<()> {
        // installs the global recorder the report counters feed into
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        let app = router::build(Arc::clone(&self.reporter))
            .route("/metrics", get(move || async move { metric_handle.render() }))
            .layer(prometheus_layer);
        let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));

        tracing::info!("Dashboard listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
