//! Main application configuration
//!
//! This module defines the configuration structures for the matchmaker
//! service, including environment variable and TOML file loading.

use crate::error::MatchmakingError;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub http: HttpSettings,
    pub matchmaking: MatchmakingSettings,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

/// Matchmaking policy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// A server not heard from for this long is removed by the next poll
    pub heartbeat_timeout_seconds: u64,
    /// A matched player who has not joined for this long is removed by the next poll
    pub join_timeout_seconds: u64,
    /// Generate player ids for enqueue requests that carry none
    pub assign_player_ids: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "matchmaker".to_string(),
            log_level: "info".to_string(),
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            heartbeat_timeout_seconds: 120,
            join_timeout_seconds: 120,
            assign_player_ids: false,
        }
    }
}

/// Upper bound for heartbeat and join timeouts (one year)
pub const MAX_TIMEOUT_SECONDS: u64 = 365 * 24 * 60 * 60;

impl MatchmakingSettings {
    pub fn heartbeat_timeout(&self) -> Result<chrono::Duration> {
        timeout_duration("heartbeat timeout", self.heartbeat_timeout_seconds)
    }

    pub fn join_timeout(&self) -> Result<chrono::Duration> {
        timeout_duration("join timeout", self.join_timeout_seconds)
    }
}

fn timeout_duration(name: &str, seconds: u64) -> Result<chrono::Duration> {
    if seconds > MAX_TIMEOUT_SECONDS {
        return Err(MatchmakingError::Configuration {
            message: format!("{} of {}s exceeds {}s", name, seconds, MAX_TIMEOUT_SECONDS),
        }
        .into());
    }
    i64::try_from(seconds)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| {
            MatchmakingError::Configuration {
                message: format!("{} out of range: {}s", name, seconds),
            }
            .into()
        })
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        MatchmakingError::Configuration {
            message: format!("Invalid {} value: {}", name, value),
        }
        .into()
    })
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still win
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse a TOML document; missing sections and fields take defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds =
                parse_var("SHUTDOWN_TIMEOUT_SECONDS", &timeout)?;
        }

        // HTTP settings
        if let Ok(host) = env::var("HTTP_HOST") {
            self.http.host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            self.http.port = parse_var("HTTP_PORT", &port)?;
        }

        // Matchmaking settings
        if let Ok(timeout) = env::var("HEARTBEAT_TIMEOUT_SECONDS") {
            self.matchmaking.heartbeat_timeout_seconds =
                parse_var("HEARTBEAT_TIMEOUT_SECONDS", &timeout)?;
        }
        if let Ok(timeout) = env::var("JOIN_TIMEOUT_SECONDS") {
            self.matchmaking.join_timeout_seconds = parse_var("JOIN_TIMEOUT_SECONDS", &timeout)?;
        }
        if let Ok(assign) = env::var("ASSIGN_PLAYER_IDS") {
            self.matchmaking.assign_player_ids = parse_var("ASSIGN_PLAYER_IDS", &assign)?;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Socket address string for the HTTP listener
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate listener
    if config.http.host.is_empty() {
        return Err(anyhow!("HTTP host cannot be empty"));
    }
    if config.http.port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }

    // Validate matchmaking settings
    if config.matchmaking.heartbeat_timeout_seconds == 0 {
        return Err(anyhow!("Heartbeat timeout must be greater than 0"));
    }
    if config.matchmaking.join_timeout_seconds == 0 {
        return Err(anyhow!("Join timeout must be greater than 0"));
    }
    config.matchmaking.heartbeat_timeout()?;
    config.matchmaking.join_timeout()?;

    Ok(())
}
