//! Matchmaking allocation and lifecycle engine
//!
//! [`Matchmaker`] owns the game server and player stores and exposes every
//! operation a game server or client can invoke. Operations are split by
//! concern:
//!
//! - `registration`: register, deregister, heartbeat, set status
//! - `queue`: enqueue and dequeue
//! - `allocation`: poll-driven expiry sweeps and server selection
//! - `notifier`: join/leave reports from game servers
//!
//! Each operation holds the engine's operation lock for its whole
//! read-modify-write cycle, so paired player/server updates never interleave.

mod allocation;
mod notifier;
mod queue;
mod registration;

pub use allocation::select_candidate;

use crate::clock::{Clock, SystemClock};
use crate::config::MatchmakingSettings;
use crate::error::{MatchmakingError, Result};
use crate::ids::{IdGenerator, UuidIdGenerator};
use crate::metrics::MetricsCollector;
use crate::store::{GameServerStore, InMemoryGameServerStore, InMemoryPlayerStore, PlayerStore};
use crate::types::{GameServer, MatchmakerStats, Player, PlayerStatus, ServerStatus};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// The matchmaking engine
#[derive(Clone)]
pub struct Matchmaker {
    /// Registered game servers
    game_servers: Arc<dyn GameServerStore>,
    /// Queued, matched and joined players
    players: Arc<dyn PlayerStore>,
    /// Time source for heartbeats and expiry
    clock: Arc<dyn Clock>,
    /// Source of server ids (and player ids when assignment is enabled)
    ids: Arc<dyn IdGenerator>,
    /// Timeouts and id policy
    settings: MatchmakingSettings,
    /// Metrics collector for recording operation outcomes
    metrics_collector: Arc<MetricsCollector>,
    /// Serializes operations against the shared stores
    op_lock: Arc<Mutex<()>>,
}

impl Matchmaker {
    /// Create an engine over the given stores, using wall-clock time and UUIDs
    pub fn new(
        game_servers: Arc<dyn GameServerStore>,
        players: Arc<dyn PlayerStore>,
        settings: MatchmakingSettings,
    ) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_components(
            game_servers,
            players,
            Arc::new(SystemClock),
            Arc::new(UuidIdGenerator),
            settings,
            metrics_collector,
        )
    }

    /// Create an engine with every collaborator supplied
    pub fn with_components(
        game_servers: Arc<dyn GameServerStore>,
        players: Arc<dyn PlayerStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        settings: MatchmakingSettings,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            game_servers,
            players,
            clock,
            ids,
            settings,
            metrics_collector,
            op_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create an engine backed by fresh in-memory stores
    pub fn in_memory(settings: MatchmakingSettings) -> Self {
        Self::new(
            Arc::new(InMemoryGameServerStore::new()),
            Arc::new(InMemoryPlayerStore::new()),
            settings,
        )
    }

    pub fn settings(&self) -> &MatchmakingSettings {
        &self.settings
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    pub fn game_server_store(&self) -> Arc<dyn GameServerStore> {
        self.game_servers.clone()
    }

    pub fn player_store(&self) -> Arc<dyn PlayerStore> {
        self.players.clone()
    }

    /// All servers with their member player ids, ordered by id
    pub async fn list_servers(&self) -> Result<Vec<GameServer>> {
        let _guard = self.op_lock.lock().await;
        let mut servers = self.game_servers.list_all().await?;
        servers.sort_by(|a, b| a.id.cmp(&b.id));
        debug!("Listing {} game servers", servers.len());
        Ok(servers)
    }

    /// All player records, ordered by id
    pub async fn list_queue(&self) -> Result<Vec<Player>> {
        let _guard = self.op_lock.lock().await;
        let mut players = self.players.list_all().await?;
        players.sort_by(|a, b| a.id.cmp(&b.id));
        debug!("Listing {} players", players.len());
        Ok(players)
    }

    /// Count servers and players by status, refreshing the gauges
    pub async fn stats(&self) -> Result<MatchmakerStats> {
        let _guard = self.op_lock.lock().await;
        let servers = self.game_servers.list_all().await?;
        let players = self.players.list_all().await?;

        let count = |status: PlayerStatus| players.iter().filter(|p| p.status == status).count();
        let stats = MatchmakerStats {
            servers_total: servers.len(),
            servers_open: servers
                .iter()
                .filter(|s| s.status == ServerStatus::Open)
                .count(),
            players_queued: count(PlayerStatus::Queued),
            players_matched: count(PlayerStatus::Matched),
            players_joined: count(PlayerStatus::Joined),
        };

        self.metrics_collector.update_from_stats(&stats);
        Ok(stats)
    }

    /// Load a server or fail with `NotFound`
    async fn existing_server(&self, id: &str) -> Result<GameServer> {
        self.game_servers
            .get(id)
            .await?
            .ok_or_else(|| MatchmakingError::server_not_found(id).into())
    }

    /// Load a player or fail with `NotFound`
    async fn existing_player(&self, id: &str) -> Result<Player> {
        self.players
            .get(id)
            .await?
            .ok_or_else(|| MatchmakingError::player_not_found(id).into())
    }

    /// Pull `player_id` out of a server's membership and persist the server.
    ///
    /// A missing server or absent member is a no-op; returns whether a write happened.
    async fn release_seat(&self, server_id: &str, player_id: &str) -> Result<bool> {
        let Some(mut server) = self.game_servers.get(server_id).await? else {
            return Ok(false);
        };
        if !server.players.remove(player_id) {
            return Ok(false);
        }
        self.game_servers.put(server).await?;
        debug!("Released seat of player '{}' on server {}", player_id, server_id);
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ids::SequentialIdGenerator;
    use crate::types::{EnqueuePlayer, RegisterServer};

    /// Engine over in-memory stores with a hand-driven clock and predictable ids
    pub fn engine() -> (Matchmaker, ManualClock) {
        engine_with(MatchmakingSettings::default())
    }

    pub fn engine_with(settings: MatchmakingSettings) -> (Matchmaker, ManualClock) {
        let clock = ManualClock::starting_now();
        let matchmaker = Matchmaker::with_components(
            Arc::new(InMemoryGameServerStore::new()),
            Arc::new(InMemoryPlayerStore::new()),
            Arc::new(clock.clone()),
            Arc::new(SequentialIdGenerator::default()),
            settings,
            Arc::new(MetricsCollector::default()),
        );
        (matchmaker, clock)
    }

    pub fn registration(address: &str, port: u16, max_players: u32) -> RegisterServer {
        RegisterServer {
            game_mode: "GM".to_string(),
            region: "EU".to_string(),
            version: "1.0".to_string(),
            address: address.to_string(),
            port,
            max_players,
        }
    }

    pub fn enqueue_request(player_id: &str) -> EnqueuePlayer {
        EnqueuePlayer {
            player_id: player_id.to_string(),
            game_mode: "GM".to_string(),
            region: "EU".to_string(),
            version: "1.0".to_string(),
            ticket: None,
        }
    }
}
