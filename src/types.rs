//! Common types used throughout the matchmaking service

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique identifier for game servers
pub type ServerId = String;

/// Identifier for players, usually supplied by the caller
pub type PlayerId = String;

/// Whether a game server accepts new players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerStatus {
    Open,
    Closed,
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStatus::Open => write!(f, "OPEN"),
            ServerStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Player lifecycle: queued, then matched to a server, then joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerStatus {
    Queued,
    Matched,
    Joined,
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerStatus::Queued => write!(f, "QUEUED"),
            PlayerStatus::Matched => write!(f, "MATCHED"),
            PlayerStatus::Joined => write!(f, "JOINED"),
        }
    }
}

/// Result status of a poll
///
/// `ServersFull` means no eligible open server exists, including the case of
/// no servers at all. The name is kept for wire compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchmakingStatus {
    MatchFound,
    WaitingForPlayers,
    ServersFull,
}

impl MatchmakingStatus {
    /// Metric label for this outcome
    pub fn label(self) -> &'static str {
        match self {
            MatchmakingStatus::MatchFound => "match_found",
            MatchmakingStatus::WaitingForPlayers => "waiting_for_players",
            MatchmakingStatus::ServersFull => "servers_full",
        }
    }
}

/// Why a player record was deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    Dequeue,
    Left,
    JoinTimeout,
}

impl RemovalReason {
    pub fn label(self) -> &'static str {
        match self {
            RemovalReason::Dequeue => "dequeue",
            RemovalReason::Left => "left",
            RemovalReason::JoinTimeout => "join_timeout",
        }
    }
}

/// Registration request sent by a game server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterServer {
    pub game_mode: String,
    pub region: String,
    pub version: String,
    pub address: String,
    pub port: u16,
    pub max_players: u32,
}

/// Enqueue request sent by a client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueuePlayer {
    pub player_id: PlayerId,
    pub game_mode: String,
    pub region: String,
    pub version: String,
    /// Opaque matchmaking handle echoed back in queue listings
    pub ticket: Option<String>,
}

/// A registered game server and the players allocated to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameServer {
    pub id: ServerId,
    pub game_mode: String,
    pub region: String,
    pub version: String,
    pub address: String,
    pub port: u16,
    pub max_players: u32,
    pub last_heartbeat: DateTime<Utc>,
    pub status: ServerStatus,
    /// Membership only; player records live in the player store
    pub players: BTreeSet<PlayerId>,
}

impl GameServer {
    /// Build a fresh server record from a registration
    pub fn from_registration(id: ServerId, request: &RegisterServer, now: DateTime<Utc>) -> Self {
        let mut server = Self {
            id,
            game_mode: String::new(),
            region: String::new(),
            version: String::new(),
            address: String::new(),
            port: 0,
            max_players: 0,
            last_heartbeat: now,
            status: ServerStatus::Open,
            players: BTreeSet::new(),
        };
        server.apply_registration(request, now);
        server
    }

    /// Overwrite every registration field, keeping only the id.
    ///
    /// Membership is reset and the server is reopened.
    pub fn apply_registration(&mut self, request: &RegisterServer, now: DateTime<Utc>) {
        self.game_mode = request.game_mode.clone();
        self.region = request.region.clone();
        self.version = request.version.clone();
        self.address = request.address.clone();
        self.port = request.port;
        self.max_players = request.max_players;
        self.players.clear();
        self.last_heartbeat = now;
        self.status = ServerStatus::Open;
    }

    pub fn occupancy(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.occupancy() >= self.max_players as usize
    }

    pub fn has_member(&self, player_id: &str) -> bool {
        self.players.contains(player_id)
    }

    /// Whether no heartbeat arrived within `timeout` before `now`
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.last_heartbeat + timeout < now
    }

    /// Open, not full, and matching the player's filters exactly
    pub fn accepts(&self, player: &Player) -> bool {
        self.status == ServerStatus::Open
            && !self.is_full()
            && self.version == player.version
            && self.game_mode == player.game_mode
            && self.region == player.region
    }

    pub fn endpoint(&self) -> ServerEndpoint {
        ServerEndpoint {
            server_id: self.id.clone(),
            address: self.address.clone(),
            port: self.port,
        }
    }

    /// Status reported to a player allocated to this server
    pub fn match_status(&self) -> MatchmakingStatus {
        if self.is_full() {
            MatchmakingStatus::MatchFound
        } else {
            MatchmakingStatus::WaitingForPlayers
        }
    }
}

/// A player in matchmaking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub game_mode: String,
    pub region: String,
    pub version: String,
    pub ticket: Option<String>,
    pub status: PlayerStatus,
    /// Lookup key of the allocated server, set iff matched or joined
    pub game_server: Option<ServerId>,
    pub matched_time: Option<DateTime<Utc>>,
    pub joined_time: Option<DateTime<Utc>>,
}

impl Player {
    /// Default record for a player id seen for the first time
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            game_mode: String::new(),
            region: String::new(),
            version: String::new(),
            ticket: None,
            status: PlayerStatus::Queued,
            game_server: None,
            matched_time: None,
            joined_time: None,
        }
    }

    /// Overwrite the filter fields from an enqueue request and reset match state
    pub fn apply_enqueue(&mut self, request: &EnqueuePlayer) {
        self.game_mode = request.game_mode.clone();
        self.region = request.region.clone();
        self.version = request.version.clone();
        self.ticket = request.ticket.clone();
        self.reset_to_queued();
    }

    /// Drop any allocation and go back to waiting
    pub fn reset_to_queued(&mut self) {
        self.status = PlayerStatus::Queued;
        self.game_server = None;
        self.matched_time = None;
        self.joined_time = None;
    }

    pub fn assign(&mut self, server_id: ServerId, now: DateTime<Utc>) {
        self.status = PlayerStatus::Matched;
        self.game_server = Some(server_id);
        self.matched_time = Some(now);
    }

    /// Mark as joined. Returns false if already joined.
    pub fn mark_joined(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == PlayerStatus::Joined {
            return false;
        }
        self.status = PlayerStatus::Joined;
        self.joined_time = Some(now);
        true
    }

    /// Matched but never joined within `timeout`
    pub fn is_join_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        match (self.status, self.matched_time) {
            (PlayerStatus::Matched, Some(matched_time)) => matched_time + timeout < now,
            _ => false,
        }
    }
}

/// Where a matched player should connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub server_id: ServerId,
    pub address: String,
    pub port: u16,
}

/// Result of polling matchmaking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOutcome {
    pub player_id: PlayerId,
    pub status: MatchmakingStatus,
    pub server: Option<ServerEndpoint>,
}

impl PollOutcome {
    pub fn allocated(player_id: PlayerId, server: &GameServer) -> Self {
        Self {
            player_id,
            status: server.match_status(),
            server: Some(server.endpoint()),
        }
    }

    pub fn no_server(player_id: PlayerId) -> Self {
        Self {
            player_id,
            status: MatchmakingStatus::ServersFull,
            server: None,
        }
    }
}

/// Acknowledgement of an enqueue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueueReceipt {
    pub player_id: PlayerId,
    pub status: PlayerStatus,
}

/// Snapshot of the engine's records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchmakerStats {
    pub servers_total: usize,
    pub servers_open: usize,
    pub players_queued: usize,
    pub players_matched: usize,
    pub players_joined: usize,
}

impl MatchmakerStats {
    pub fn players_total(&self) -> usize {
        self.players_queued + self.players_matched + self.players_joined
    }
}
