//! HTTP surface of the matchmaker
//!
//! Game servers and clients reach every engine operation through JSON
//! endpoints; health, stats and Prometheus metrics are served alongside.

pub mod handlers;
pub mod protocol;

use crate::config::HttpSettings;
use crate::engine::Matchmaker;
use crate::metrics::MetricsCollector;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub matchmaker: Matchmaker,
    pub metrics_collector: Arc<MetricsCollector>,
    pub service_name: String,
    pub is_running: Arc<RwLock<bool>>,
}

impl HttpState {
    /// State for a running service named `service_name`
    pub fn new(matchmaker: Matchmaker, service_name: impl Into<String>) -> Self {
        Self {
            metrics_collector: matchmaker.metrics(),
            matchmaker,
            service_name: service_name.into(),
            is_running: Arc::new(RwLock::new(true)),
        }
    }

    /// Share a running flag owned by the service
    pub fn with_running_flag(mut self, is_running: Arc<RwLock<bool>>) -> Self {
        self.is_running = is_running;
        self
    }
}

/// Build the router for all endpoints
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats))
        .route("/metrics", get(handlers::metrics))
        .route("/client/servers", get(handlers::list_servers))
        .route("/client/enqueue", post(handlers::enqueue))
        .route("/client/dequeue", post(handlers::dequeue))
        .route("/client/pollMatchmaking", post(handlers::poll_matchmaking))
        .route("/server/register", post(handlers::register))
        .route("/server/deregister", post(handlers::deregister))
        .route("/server/sendHeartbeat", post(handlers::heartbeat))
        .route("/server/setStatus", post(handlers::set_status))
        .route(
            "/server/notifyPlayerJoined",
            post(handlers::notify_player_joined),
        )
        .route("/server/notifyPlayerLeft", post(handlers::notify_player_left))
        .route("/admin/queue", get(handlers::list_queue))
        .with_state(state)
}

/// HTTP server with graceful shutdown
pub struct HttpServer {
    settings: HttpSettings,
    state: HttpState,
    shutdown_tx: broadcast::Sender<()>,
}

impl HttpServer {
    pub fn new(settings: HttpSettings, state: HttpState) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            settings,
            state,
            shutdown_tx,
        }
    }

    /// Bind and serve until [`HttpServer::stop`] is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.settings.host, self.settings.port)
            .parse()
            .context("Invalid HTTP listen address")?;

        let app = router(self.state.clone());
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("Matchmaking API listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server shutdown signal received");
            })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        info!("Stopping HTTP server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }
        Ok(())
    }
}
