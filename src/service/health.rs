//! Health checks for the matchmaker service
//!
//! A check probes both record stores and the running flag, then rolls the
//! component results up into one status.

use crate::engine::Matchmaker;
use crate::types::MatchmakerStats;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Gauge value (0=unhealthy, 1=degraded, 2=healthy)
    pub fn level(self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Engine counts, when the stores could be read
    pub stats: Option<MatchmakerStats>,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Optional error message if unhealthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

impl ComponentCheck {
    fn from_probe(name: &str, start: std::time::Instant, probe: Result<usize>) -> Self {
        let (status, message) = match probe {
            Ok(count) => {
                debug!("{} probe read {} records", name, count);
                (HealthStatus::Healthy, None)
            }
            Err(e) => {
                error!("{} probe failed: {}", name, e);
                (HealthStatus::Unhealthy, Some(e.to_string()))
            }
        };

        Self {
            name: name.to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

impl HealthCheck {
    /// Probe the running flag and both stores, recording the result as metrics
    pub async fn check(matchmaker: &Matchmaker, service_name: &str, running: bool) -> Result<Self> {
        let mut checks = Vec::new();

        let start = std::time::Instant::now();
        checks.push(ComponentCheck {
            name: "service_running".to_string(),
            status: if running {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            message: (!running).then(|| "Service is not running".to_string()),
            duration_ms: start.elapsed().as_millis() as u64,
        });

        let start = std::time::Instant::now();
        let probe = matchmaker.game_server_store().list_all().await.map(|s| s.len());
        checks.push(ComponentCheck::from_probe("game_server_store", start, probe));

        let start = std::time::Instant::now();
        let probe = matchmaker.player_store().list_all().await.map(|p| p.len());
        checks.push(ComponentCheck::from_probe("player_store", start, probe));

        let status = if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let stats = if status == HealthStatus::Unhealthy {
            None
        } else {
            matchmaker.stats().await.ok()
        };

        let metrics = matchmaker.metrics();
        metrics.update_health_status(status.level());
        for check in &checks {
            metrics.update_component_health(&check.name, check.status == HealthStatus::Healthy);
        }

        Ok(HealthCheck {
            status,
            service: service_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check - just the running flag
    pub fn liveness_check(running: bool) -> HealthStatus {
        if running {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchmakingSettings;

    #[tokio::test]
    async fn test_healthy_when_running_and_stores_readable() {
        let matchmaker = Matchmaker::in_memory(MatchmakingSettings::default());
        let health = HealthCheck::check(&matchmaker, "matchmaker", true)
            .await
            .unwrap();

        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.checks.len(), 3);
        assert_eq!(health.stats, Some(MatchmakerStats::default()));
        assert_eq!(matchmaker.metrics().service().health_status.get(), 2);
    }

    #[tokio::test]
    async fn test_unhealthy_when_stopped() {
        let matchmaker = Matchmaker::in_memory(MatchmakingSettings::default());
        let health = HealthCheck::check(&matchmaker, "matchmaker", false)
            .await
            .unwrap();

        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert!(health.stats.is_none());
        assert_eq!(
            HealthCheck::liveness_check(false),
            HealthStatus::Unhealthy
        );
    }
}
