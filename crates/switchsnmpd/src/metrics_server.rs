//! HTTP server for the Prometheus metrics endpoint
//!
//! Serves `GET /metrics` in the Prometheus text format on the address given
//! by `metrics_listen`. Plain HTTP; put a reverse proxy in front for TLS.

use crate::error::{GatewayError, Result};
use crate::metrics::MetricsCollector;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Metrics HTTP server bound to its listener
pub struct MetricsServer {
    listener: TcpListener,
    metrics: MetricsCollector,
}

impl MetricsServer {
    /// Bind the listener
    pub async fn bind(addr: SocketAddr, metrics: MetricsCollector) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind {
                what: "metrics server",
                addr: addr.to_string(),
                source: Box::new(source),
            })?;

        Ok(Self { listener, metrics })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    fn router(metrics: MetricsCollector) -> Router {
        Router::new().route(
            "/metrics",
            get(move || {
                let metrics_text = metrics.gather_metrics();
                async move { metrics_text }
            }),
        )
    }

    /// Serve until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(addr = ?self.listener.local_addr().ok(), "Metrics server listening");

        axum::serve(self.listener, Self::router(self.metrics))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| GatewayError::Other(format!("Metrics server error: {}", e)))
    }
}
