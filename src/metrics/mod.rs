//! Metrics for the matchmaker service
//!
//! Prometheus counters, gauges and histograms describing registrations,
//! queue traffic, allocation outcomes and expiry sweeps.

pub mod collector;

pub use collector::{
    MetricsCollector, MetricsTimer, PerformanceMetrics, PlayerMetrics, ServerMetrics,
    ServiceMetrics,
};
