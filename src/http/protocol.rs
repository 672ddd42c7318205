//! JSON request and response bodies for the HTTP API
//!
//! String fields missing from a request deserialize as empty strings so the
//! engine's ordered validation decides which error the caller sees.

use crate::types::{
    EnqueuePlayer, GameServer, MatchmakingStatus, Player, PlayerStatus, PollOutcome,
    RegisterServer, ServerStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterServerRequest {
    pub game_mode: String,
    pub region: String,
    pub version: String,
    #[serde(rename = "ipV4Address")]
    pub ip_v4_address: String,
    pub port: u16,
    pub max_players: u32,
}

impl From<RegisterServerRequest> for RegisterServer {
    fn from(request: RegisterServerRequest) -> Self {
        Self {
            game_mode: request.game_mode,
            region: request.region,
            version: request.version,
            address: request.ip_v4_address,
            port: request.port,
            max_players: request.max_players,
        }
    }
}

/// Body naming a single game server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerIdRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    #[serde(default)]
    pub id: String,
    pub status: ServerStatus,
}

/// Join/leave report from a game server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerNotificationRequest {
    pub server_id: String,
    pub player_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnqueueRequest {
    pub player_id: String,
    pub game_mode: String,
    pub region: String,
    pub version: String,
    pub ticket: Option<String>,
}

impl From<EnqueueRequest> for EnqueuePlayer {
    fn from(request: EnqueueRequest) -> Self {
        Self {
            player_id: request.player_id,
            game_mode: request.game_mode,
            region: request.region,
            version: request.version,
            ticket: request.ticket,
        }
    }
}

/// Body naming a single player
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerIdRequest {
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedResponse {
    pub removed_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub updated_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusResponse {
    pub id: String,
    pub status: ServerStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerNotificationResponse {
    pub server_id: String,
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub player_id: String,
    pub status: PlayerStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub player_id: String,
    pub status: MatchmakingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    #[serde(rename = "ipV4Address", skip_serializing_if = "Option::is_none")]
    pub ip_v4_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl From<PollOutcome> for PollResponse {
    fn from(outcome: PollOutcome) -> Self {
        let (server_id, ip_v4_address, port) = match outcome.server {
            Some(endpoint) => (
                Some(endpoint.server_id),
                Some(endpoint.address),
                Some(endpoint.port),
            ),
            None => (None, None, None),
        };
        Self {
            player_id: outcome.player_id,
            status: outcome.status,
            server_id,
            ip_v4_address,
            port,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerListing {
    pub id: String,
    pub game_mode: String,
    pub region: String,
    pub version: String,
    #[serde(rename = "ipV4Address")]
    pub ip_v4_address: String,
    pub port: u16,
    pub max_players: u32,
    pub last_heartbeat: DateTime<Utc>,
    pub status: ServerStatus,
    pub player_ids: Vec<String>,
}

impl From<GameServer> for ServerListing {
    fn from(server: GameServer) -> Self {
        Self {
            id: server.id,
            game_mode: server.game_mode,
            region: server.region,
            version: server.version,
            ip_v4_address: server.address,
            port: server.port,
            max_players: server.max_players,
            last_heartbeat: server.last_heartbeat,
            status: server.status,
            player_ids: server.players.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServersResponse {
    pub servers: Vec<ServerListing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueListing {
    pub player_id: String,
    pub ticket: Option<String>,
    pub game_mode: String,
    pub region: String,
    pub version: String,
    pub status: PlayerStatus,
    pub server_id: Option<String>,
    pub matched_time: Option<DateTime<Utc>>,
    pub joined_time: Option<DateTime<Utc>>,
}

impl From<Player> for QueueListing {
    fn from(player: Player) -> Self {
        Self {
            player_id: player.id,
            ticket: player.ticket,
            game_mode: player.game_mode,
            region: player.region,
            version: player.version,
            status: player.status,
            server_id: player.game_server,
            matched_time: player.matched_time,
            joined_time: player.joined_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueResponse {
    pub players: Vec<QueueListing>,
}

/// Body of every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
    pub error_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServerEndpoint;
    use serde_json::json;

    #[test]
    fn test_missing_strings_default_to_empty() {
        let request: RegisterServerRequest =
            serde_json::from_value(json!({ "region": "EU", "port": 8888 })).unwrap();
        assert!(request.game_mode.is_empty());
        assert!(request.ip_v4_address.is_empty());
        assert_eq!(request.port, 8888);
        assert_eq!(request.max_players, 0);

        let request: PlayerNotificationRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.server_id.is_empty());
    }

    #[test]
    fn test_register_request_uses_wire_names() {
        let request: RegisterServerRequest = serde_json::from_value(json!({
            "gameMode": "GM",
            "region": "EU",
            "version": "1.0",
            "ipV4Address": "1.2.3.4",
            "port": 8888,
            "maxPlayers": 2
        }))
        .unwrap();
        let register: RegisterServer = request.into();
        assert_eq!(register.address, "1.2.3.4");
        assert_eq!(register.max_players, 2);
    }

    #[test]
    fn test_poll_response_omits_server_when_unallocated() {
        let body = serde_json::to_value(PollResponse::from(PollOutcome {
            player_id: "p1".to_string(),
            status: MatchmakingStatus::ServersFull,
            server: None,
        }))
        .unwrap();
        assert_eq!(body, json!({ "playerId": "p1", "status": "SERVERS_FULL" }));

        let body = serde_json::to_value(PollResponse::from(PollOutcome {
            player_id: "p1".to_string(),
            status: MatchmakingStatus::MatchFound,
            server: Some(ServerEndpoint {
                server_id: "s1".to_string(),
                address: "1.2.3.4".to_string(),
                port: 8888,
            }),
        }))
        .unwrap();
        assert_eq!(body["serverId"], "s1");
        assert_eq!(body["ipV4Address"], "1.2.3.4");
        assert_eq!(body["port"], 8888);
    }
}
