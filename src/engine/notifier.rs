//! Join and leave reports from game servers

use super::Matchmaker;
use crate::error::{require, Field, MatchmakingError, Result};
use crate::types::{GameServer, RemovalReason};
use tracing::{debug, info};

impl Matchmaker {
    /// Record that a matched player connected to its server.
    ///
    /// Returns false when the player had already joined; the join time is
    /// left untouched in that case.
    pub async fn notify_player_joined(&self, server_id: &str, player_id: &str) -> Result<bool> {
        require(server_id, Field::GameServerId)?;
        require(player_id, Field::PlayerId)?;

        let _guard = self.op_lock.lock().await;
        self.member_server(server_id, player_id).await?;

        let mut player = self.existing_player(player_id).await?;
        if !player.mark_joined(self.clock.now()) {
            debug!(
                "Player '{}' already joined server {}",
                player_id, server_id
            );
            return Ok(false);
        }
        self.players.put(player).await?;

        info!("Player '{}' joined server {}", player_id, server_id);
        Ok(true)
    }

    /// Record that a player left its server. The player record is deleted;
    /// returning to matchmaking takes a fresh enqueue.
    pub async fn notify_player_left(&self, server_id: &str, player_id: &str) -> Result<()> {
        require(server_id, Field::GameServerId)?;
        require(player_id, Field::PlayerId)?;

        let _guard = self.op_lock.lock().await;
        let mut server = self.member_server(server_id, player_id).await?;

        server.players.remove(player_id);
        self.game_servers.put(server).await?;
        self.players.delete(player_id).await?;
        self.metrics_collector
            .record_player_removed(RemovalReason::Left);

        info!("Player '{}' left server {}", player_id, server_id);
        Ok(())
    }

    /// Load a server that must list `player_id` as a member
    async fn member_server(&self, server_id: &str, player_id: &str) -> Result<GameServer> {
        let server = self.existing_server(server_id).await?;
        if !server.has_member(player_id) {
            return Err(MatchmakingError::PlayerNotFoundForServer {
                server_id: server_id.to_string(),
                player_id: player_id.to_string(),
            }
            .into());
        }
        Ok(server)
    }
}
