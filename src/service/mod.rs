//! Service layer for the matchmaker
//!
//! This module contains the application state that wires the engine to its
//! HTTP surface, plus health checks.

pub mod app;
pub mod health;

pub use app::{AppState, ServiceError};
pub use health::{ComponentCheck, HealthCheck, HealthStatus};
