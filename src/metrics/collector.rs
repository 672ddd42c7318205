//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the matchmaker service using
//! Prometheus metrics.

use crate::types::{MatchmakerStats, MatchmakingStatus, RemovalReason};
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the matchmaker service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Game server metrics
    server_metrics: ServerMetrics,

    /// Player metrics
    player_metrics: PlayerMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Game server metrics
#[derive(Clone)]
pub struct ServerMetrics {
    /// Registrations, split into new and re-registered servers
    pub registrations_total: IntCounterVec,

    /// Explicit deregistrations
    pub deregistrations_total: IntCounter,

    /// Servers removed by the heartbeat sweep
    pub expired_total: IntCounter,

    /// Servers currently registered
    pub active_servers: IntGauge,

    /// Servers currently open for allocation
    pub open_servers: IntGauge,
}

/// Player metrics
#[derive(Clone)]
pub struct PlayerMetrics {
    /// Enqueue calls
    pub enqueued_total: IntCounter,

    /// Player records deleted, by reason
    pub removed_total: IntCounterVec,

    /// Poll results, by outcome
    pub polls_total: IntCounterVec,

    /// Players currently known, by status
    pub players_by_status: IntGaugeVec,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Time spent in a poll, sweeps included
    pub poll_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let server_metrics = ServerMetrics::new(&registry)?;
        let player_metrics = PlayerMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            server_metrics,
            player_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    pub fn server(&self) -> &ServerMetrics {
        &self.server_metrics
    }

    pub fn player(&self) -> &PlayerMetrics {
        &self.player_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Update gauges from an engine snapshot
    pub fn update_from_stats(&self, stats: &MatchmakerStats) {
        self.server_metrics
            .active_servers
            .set(stats.servers_total as i64);
        self.server_metrics.open_servers.set(stats.servers_open as i64);

        let by_status = &self.player_metrics.players_by_status;
        by_status
            .with_label_values(&["queued"])
            .set(stats.players_queued as i64);
        by_status
            .with_label_values(&["matched"])
            .set(stats.players_matched as i64);
        by_status
            .with_label_values(&["joined"])
            .set(stats.players_joined as i64);
    }

    /// Record a server registration
    pub fn record_server_registered(&self, reregistered: bool) {
        let kind = if reregistered { "reregistered" } else { "new" };
        self.server_metrics
            .registrations_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn record_server_deregistered(&self) {
        self.server_metrics.deregistrations_total.inc();
    }

    /// Record servers dropped by the heartbeat sweep
    pub fn record_servers_expired(&self, count: usize) {
        self.server_metrics.expired_total.inc_by(count as u64);
    }

    pub fn record_player_enqueued(&self) {
        self.player_metrics.enqueued_total.inc();
    }

    pub fn record_player_removed(&self, reason: RemovalReason) {
        self.player_metrics
            .removed_total
            .with_label_values(&[reason.label()])
            .inc();
    }

    /// Record a completed poll
    pub fn record_poll(&self, status: MatchmakingStatus, duration: Duration) {
        self.player_metrics
            .polls_total
            .with_label_values(&[status.label()])
            .inc();

        self.performance_metrics
            .poll_duration
            .observe(duration.as_secs_f64());
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let health_status = IntGauge::new(
            "matchmaker_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("matchmaker_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            health_status,
            component_health,
        })
    }
}

impl ServerMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let registrations_total = IntCounterVec::new(
            Opts::new(
                "matchmaker_server_registrations_total",
                "Game server registrations",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(registrations_total.clone()))?;

        let deregistrations_total = IntCounter::new(
            "matchmaker_server_deregistrations_total",
            "Game server deregistrations",
        )?;
        registry.register(Box::new(deregistrations_total.clone()))?;

        let expired_total = IntCounter::new(
            "matchmaker_servers_expired_total",
            "Game servers removed after missing heartbeats",
        )?;
        registry.register(Box::new(expired_total.clone()))?;

        let active_servers =
            IntGauge::new("matchmaker_active_servers", "Registered game servers")?;
        registry.register(Box::new(active_servers.clone()))?;

        let open_servers = IntGauge::new("matchmaker_open_servers", "Open game servers")?;
        registry.register(Box::new(open_servers.clone()))?;

        Ok(Self {
            registrations_total,
            deregistrations_total,
            expired_total,
            active_servers,
            open_servers,
        })
    }
}

impl PlayerMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let enqueued_total =
            IntCounter::new("matchmaker_players_enqueued_total", "Enqueue requests")?;
        registry.register(Box::new(enqueued_total.clone()))?;

        let removed_total = IntCounterVec::new(
            Opts::new("matchmaker_players_removed_total", "Player records removed"),
            &["reason"],
        )?;
        registry.register(Box::new(removed_total.clone()))?;

        let polls_total = IntCounterVec::new(
            Opts::new("matchmaker_polls_total", "Matchmaking polls by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(polls_total.clone()))?;

        let players_by_status = IntGaugeVec::new(
            Opts::new("matchmaker_players", "Players currently known by status"),
            &["status"],
        )?;
        registry.register(Box::new(players_by_status.clone()))?;

        Ok(Self {
            enqueued_total,
            removed_total,
            polls_total,
            players_by_status,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let poll_duration = Histogram::with_opts(
            HistogramOpts::new(
                "matchmaker_poll_duration_seconds",
                "Matchmaking poll processing time",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        )?;
        registry.register(Box::new(poll_duration.clone()))?;

        Ok(Self { poll_duration })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
