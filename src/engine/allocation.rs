//! Poll-driven allocation
//!
//! A poll runs in fixed order: answer immediately for an already allocated
//! player, sweep servers whose heartbeat lapsed, sweep matched players who
//! never joined, then seat the polling player on the fullest eligible server.
//! Expiry is lazy and only as fresh as the most recent poll from anyone.

use super::Matchmaker;
use crate::error::{require, Field, Result};
use crate::types::{GameServer, Player, PollOutcome, RemovalReason, ServerId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Pick the server a player should be seated on.
///
/// Only open, non-full servers with the player's exact mode, region and
/// version qualify. The fullest wins so partially filled servers complete
/// first; equal occupancy falls back to the lowest id.
pub fn select_candidate<'a, I>(servers: I, player: &Player) -> Option<&'a GameServer>
where
    I: IntoIterator<Item = &'a GameServer>,
{
    servers
        .into_iter()
        .filter(|server| server.accepts(player))
        .min_by(|a, b| {
            b.occupancy()
                .cmp(&a.occupancy())
                .then_with(|| a.id.cmp(&b.id))
        })
}

impl Matchmaker {
    /// Poll for a server on behalf of a queued or already matched player
    pub async fn poll_matchmaking(&self, player_id: &str) -> Result<PollOutcome> {
        require(player_id, Field::PlayerId)?;

        let timer = self.metrics_collector.start_timer();
        let _guard = self.op_lock.lock().await;
        let now = self.clock.now();

        let outcome = self.poll_locked(player_id, now).await?;

        self.metrics_collector
            .record_poll(outcome.status, timer.stop());
        Ok(outcome)
    }

    async fn poll_locked(&self, player_id: &str, now: DateTime<Utc>) -> Result<PollOutcome> {
        let mut player = self.existing_player(player_id).await?;

        if let Some(server_id) = player.game_server.clone() {
            match self.game_servers.get(&server_id).await? {
                Some(server) => {
                    if !server.has_member(&player.id) {
                        warn!(
                            "Player '{}' references server {} which no longer lists it",
                            player.id, server_id
                        );
                    }
                    debug!(
                        "Player '{}' already allocated to server {} ({}/{})",
                        player.id,
                        server.id,
                        server.occupancy(),
                        server.max_players
                    );
                    return Ok(PollOutcome::allocated(player.id, &server));
                }
                None => {
                    warn!(
                        "Player '{}' was allocated to vanished server {}, requeueing",
                        player.id, server_id
                    );
                    player.reset_to_queued();
                    self.players.put(player.clone()).await?;
                }
            }
        }

        let mut servers = self.sweep_expired_servers(now).await?;
        self.sweep_players(now, &mut servers).await?;

        let Some(candidate) = select_candidate(servers.values(), &player) else {
            debug!(
                "No eligible server for player '{}' (mode: {}, region: {}, version: {})",
                player.id, player.game_mode, player.region, player.version
            );
            return Ok(PollOutcome::no_server(player.id));
        };

        let mut server = candidate.clone();
        server.players.insert(player.id.clone());
        player.assign(server.id.clone(), now);

        self.players.put(player.clone()).await?;
        self.game_servers.put(server.clone()).await?;

        let outcome = PollOutcome::allocated(player.id, &server);
        info!(
            "Allocated player '{}' to server {} ({}/{}) - status: {:?}",
            outcome.player_id,
            server.id,
            server.occupancy(),
            server.max_players,
            outcome.status
        );
        Ok(outcome)
    }

    /// Delete every server whose heartbeat lapsed; returns the survivors by id
    async fn sweep_expired_servers(
        &self,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<ServerId, GameServer>> {
        let timeout = self.settings.heartbeat_timeout()?;
        let mut live = BTreeMap::new();
        let mut expired = 0;

        for server in self.game_servers.list_all().await? {
            if server.is_expired(now, timeout) {
                self.game_servers.delete(&server.id).await?;
                info!(
                    "Expired server {} (last heartbeat {})",
                    server.id, server.last_heartbeat
                );
                expired += 1;
            } else {
                live.insert(server.id.clone(), server);
            }
        }

        if expired > 0 {
            self.metrics_collector.record_servers_expired(expired);
        }
        Ok(live)
    }

    /// Remove players who never joined and requeue players whose server is gone.
    ///
    /// Join expiry wins over requeueing. Freed seats are written back and
    /// reflected in `servers`.
    async fn sweep_players(
        &self,
        now: DateTime<Utc>,
        servers: &mut BTreeMap<ServerId, GameServer>,
    ) -> Result<()> {
        let timeout = self.settings.join_timeout()?;

        for mut player in self.players.list_all().await? {
            let Some(server_id) = player.game_server.clone() else {
                continue;
            };

            if player.is_join_expired(now, timeout) {
                if let Some(server) = servers.get_mut(&server_id) {
                    if server.players.remove(&player.id) {
                        self.game_servers.put(server.clone()).await?;
                    }
                }
                self.players.delete(&player.id).await?;
                self.metrics_collector
                    .record_player_removed(RemovalReason::JoinTimeout);
                info!(
                    "Removed player '{}' from server {}: never joined",
                    player.id, server_id
                );
                continue;
            }

            if !servers.contains_key(&server_id) {
                warn!(
                    "Requeueing player '{}' whose server {} is gone",
                    player.id, server_id
                );
                player.reset_to_queued();
                self.players.put(player).await?;
            }
        }

        Ok(())
    }
}
