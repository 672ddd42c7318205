//! Matchmaker - allocation and lifecycle engine for game servers
//!
//! Game servers register and heartbeat; clients enqueue and poll. Each poll
//! expires stale servers and unjoined players, then seats the polling player
//! on the fullest open server matching its game mode, region and version.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod ids;
pub mod metrics;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::Matchmaker;
pub use ids::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use store::{GameServerStore, InMemoryGameServerStore, InMemoryPlayerStore, PlayerStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
