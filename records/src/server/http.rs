//! HTTP server implementation for the record store.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::signal;

use super::config::RecordServerConfig;
use super::handlers::{AppState, handle_healthy, handle_metrics, handle_ready, handle_request};
use super::metrics::Metrics;
use super::middleware::{MetricsLayer, TracingLayer};
use crate::auth::Authenticator;
use crate::error::{Error, Result};
use crate::store::RecordStore;

/// Builds the application router.
///
/// Operational endpoints are matched first and skip authentication; every
/// other path falls through to the authenticated record handler.
pub fn build_router(state: AppState) -> Router {
    let metrics = state.metrics.clone();
    Router::new()
        .route("/metrics", get(handle_metrics))
        .route("/-/healthy", get(handle_healthy))
        .route("/-/ready", get(handle_ready))
        .fallback(handle_request)
        .layer(TracingLayer::new())
        .layer(MetricsLayer::new(metrics))
        .with_state(state)
}

/// HTTP server for the record store.
pub struct RecordServer {
    store: Arc<RecordStore>,
    authenticator: Authenticator,
    config: RecordServerConfig,
}

impl RecordServer {
    /// Create a new record server.
    pub fn new(
        store: Arc<RecordStore>,
        authenticator: Authenticator,
        config: RecordServerConfig,
    ) -> Self {
        Self {
            store,
            authenticator,
            config,
        }
    }

    /// Run the HTTP server until SIGINT or SIGTERM, then flush and close
    /// the store.
    pub async fn run(self) -> Result<()> {
        let state = AppState {
            store: self.store.clone(),
            authenticator: self.authenticator,
            metrics: Arc::new(Metrics::new()),
        };
        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        tracing::info!("Starting record HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Internal(format!("failed to bind {}: {}", addr, e)))?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(format!("server error: {}", e)))?;

        tracing::info!("Flushing storage before shutdown...");
        if let Err(e) = self.store.flush().await {
            tracing::error!("Failed to flush storage on shutdown: {}", e);
        }
        self.store.close().await?;

        tracing::info!("Server shut down gracefully");
        Ok(())
    }
}

/// Listen for SIGTERM (K8s pod termination) and SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
