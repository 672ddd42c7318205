//! Main application state and service coordination
//!
//! This module contains the AppState that builds the engine from
//! configuration, serves it over HTTP and runs the gauge refresh task.

use crate::config::AppConfig;
use crate::engine::Matchmaker;
use crate::http::{HttpServer, HttpState};
use crate::metrics::MetricsCollector;
use crate::service::health::HealthCheck;
use crate::store::{InMemoryGameServerStore, InMemoryPlayerStore};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// How often gauges and health status are refreshed
const GAUGE_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// The matchmaking engine
    matchmaker: Matchmaker,

    /// HTTP API server
    http_server: Arc<HttpServer>,

    /// Background task handles
    background_tasks: Vec<JoinHandle<()>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Initialize the application with all dependencies
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing {} matchmaking service", config.service.name);
        info!(
            "Configuration: http={}, heartbeat_timeout={}s, join_timeout={}s, assign_player_ids={}",
            config.http_address(),
            config.matchmaking.heartbeat_timeout_seconds,
            config.matchmaking.join_timeout_seconds,
            config.matchmaking.assign_player_ids
        );

        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let matchmaker = Matchmaker::with_components(
            Arc::new(InMemoryGameServerStore::new()),
            Arc::new(InMemoryPlayerStore::new()),
            Arc::new(crate::clock::SystemClock),
            Arc::new(crate::ids::UuidIdGenerator),
            config.matchmaking.clone(),
            metrics_collector,
        );

        let is_running = Arc::new(RwLock::new(false));
        let http_state = HttpState::new(matchmaker.clone(), config.service.name.clone())
            .with_running_flag(is_running.clone());
        let http_server = Arc::new(HttpServer::new(config.http.clone(), http_state));

        Ok(Self {
            config,
            matchmaker,
            http_server,
            background_tasks: Vec::new(),
            is_running,
        })
    }

    /// Start the HTTP server and background tasks
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        info!("Starting {} matchmaking service", self.config.service.name);

        *self.is_running.write().await = true;

        self.start_http_server().await?;
        self.start_background_tasks();

        info!("Matchmaking service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of {}", self.config.service.name);

        *self.is_running.write().await = false;

        if let Err(e) = self.http_server.stop().await {
            warn!("Failed to stop HTTP server: {}", e);
        }

        self.stop_background_tasks().await;

        let final_stats =
            self.matchmaker
                .stats()
                .await
                .map_err(|e| ServiceError::BackgroundTask {
                    message: format!("Failed to get final stats: {}", e),
                })?;

        info!("Final service statistics: {:?}", final_stats);
        info!("Matchmaking service shutdown completed");
        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the matchmaking engine
    pub fn matchmaker(&self) -> &Matchmaker {
        &self.matchmaker
    }

    /// Run a full health check against the live engine
    pub async fn health(&self) -> anyhow::Result<HealthCheck> {
        HealthCheck::check(
            &self.matchmaker,
            &self.config.service.name,
            self.is_running().await,
        )
        .await
    }

    async fn start_http_server(&mut self) -> Result<(), ServiceError> {
        let http_server = self.http_server.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = http_server.start().await {
                error!("HTTP server failed: {:#}", e);
            } else {
                info!("HTTP server task completed");
            }
        });
        self.background_tasks.push(handle);

        // Give the listener a moment to bind
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        info!("HTTP API started on {}", self.config.http_address());
        Ok(())
    }

    /// Periodically refresh gauges and health metrics
    fn start_background_tasks(&mut self) {
        let matchmaker = self.matchmaker.clone();
        let service_name = self.config.service.name.clone();
        let is_running = self.is_running.clone();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(GAUGE_REFRESH_INTERVAL);
            info!("Gauge refresh task started");

            while *is_running.read().await {
                interval.tick().await;

                match HealthCheck::check(&matchmaker, &service_name, *is_running.read().await)
                    .await
                {
                    Ok(health) => debug!(
                        "Refreshed gauges - status: {}, stats: {:?}",
                        health.status, health.stats
                    ),
                    Err(e) => warn!("Failed to refresh gauges: {}", e),
                }
            }

            info!("Gauge refresh task stopped");
        });

        self.background_tasks.push(task);
    }

    /// Stop all background tasks
    async fn stop_background_tasks(&mut self) {
        let task_count = self.background_tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return;
        }

        info!("Stopping {} background tasks...", task_count);

        // Let the HTTP server drain before aborting whatever is left
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;

        for (i, task) in self.background_tasks.drain(..).enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        info!("All {} background tasks stopped", task_count);
    }
}
