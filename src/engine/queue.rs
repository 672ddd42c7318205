//! Player queue management

use super::Matchmaker;
use crate::error::{require, Field, Result};
use crate::types::{EnqueuePlayer, EnqueueReceipt, Player, PlayerId, RemovalReason};
use tracing::{debug, info};

impl Matchmaker {
    /// Put a player into the queue, creating the record on first sight.
    ///
    /// Re-enqueueing an allocated player releases its seat and resets all
    /// match state, so this is also how a client retries after a failed match.
    pub async fn enqueue(&self, mut request: EnqueuePlayer) -> Result<EnqueueReceipt> {
        if request.player_id.is_empty() && self.settings.assign_player_ids {
            request.player_id = self.ids.generate();
            debug!("Assigned player id '{}'", request.player_id);
        }

        require(&request.player_id, Field::PlayerId)?;
        require(&request.game_mode, Field::GameMode)?;
        require(&request.region, Field::Region)?;
        require(&request.version, Field::Version)?;

        let _guard = self.op_lock.lock().await;

        let mut player = self
            .players
            .get(&request.player_id)
            .await?
            .unwrap_or_else(|| Player::new(request.player_id.clone()));

        if let Some(server_id) = player.game_server.as_deref() {
            self.release_seat(server_id, &player.id).await?;
            info!(
                "Player '{}' re-enqueued, leaving server {}",
                player.id, server_id
            );
        }

        player.apply_enqueue(&request);
        let receipt = EnqueueReceipt {
            player_id: player.id.clone(),
            status: player.status,
        };
        self.players.put(player).await?;
        self.metrics_collector.record_player_enqueued();

        info!(
            "Enqueued player '{}' - mode: {}, region: {}, version: {}",
            receipt.player_id, request.game_mode, request.region, request.version
        );
        Ok(receipt)
    }

    /// Remove a player from matchmaking entirely
    pub async fn dequeue(&self, player_id: &str) -> Result<PlayerId> {
        require(player_id, Field::PlayerId)?;

        let _guard = self.op_lock.lock().await;
        let player = self.existing_player(player_id).await?;

        if let Some(server_id) = player.game_server.as_deref() {
            self.release_seat(server_id, &player.id).await?;
        }
        self.players.delete(&player.id).await?;
        self.metrics_collector
            .record_player_removed(RemovalReason::Dequeue);

        info!("Dequeued player '{}'", player.id);
        Ok(player.id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::config::MatchmakingSettings;
    use crate::error::{Entity, Field, MatchmakingError};
    use crate::types::PlayerStatus;

    #[tokio::test]
    async fn test_enqueue_validates_fields_in_order() {
        let (matchmaker, _clock) = engine();
        let cases = [
            (
                {
                    let mut r = enqueue_request("");
                    r.version.clear();
                    r
                },
                Field::PlayerId,
            ),
            (
                {
                    let mut r = enqueue_request("p1");
                    r.game_mode.clear();
                    r.region.clear();
                    r
                },
                Field::GameMode,
            ),
            (
                {
                    let mut r = enqueue_request("p1");
                    r.region.clear();
                    r
                },
                Field::Region,
            ),
            (
                {
                    let mut r = enqueue_request("p1");
                    r.version.clear();
                    r
                },
                Field::Version,
            ),
        ];

        for (request, expected) in cases {
            let err = matchmaker.enqueue(request).await.unwrap_err();
            match err.downcast_ref::<MatchmakingError>() {
                Some(MatchmakingError::Validation { field }) => assert_eq!(*field, expected),
                other => panic!("unexpected error: {:?}", other),
            }
        }
        assert!(matchmaker.list_queue().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_creates_queued_player_with_ticket() {
        let (matchmaker, _clock) = engine();
        let mut request = enqueue_request("p1");
        request.ticket = Some("ticket-42".to_string());

        let receipt = matchmaker.enqueue(request).await.unwrap();
        assert_eq!(receipt.player_id, "p1");
        assert_eq!(receipt.status, PlayerStatus::Queued);

        let player = matchmaker.players.get("p1").await.unwrap().unwrap();
        assert_eq!(player.ticket.as_deref(), Some("ticket-42"));
        assert!(player.game_server.is_none());
    }

    #[tokio::test]
    async fn test_reenqueue_resets_match_state_and_releases_seat() {
        let (matchmaker, clock) = engine();
        let server_id = matchmaker
            .register(registration("1.2.3.4", 8888, 4))
            .await
            .unwrap();
        matchmaker.enqueue(enqueue_request("p1")).await.unwrap();
        matchmaker.poll_matchmaking("p1").await.unwrap();
        clock.advance_seconds(5);
        matchmaker
            .notify_player_joined(&server_id, "p1")
            .await
            .unwrap();

        let mut request = enqueue_request("p1");
        request.region = "US".to_string();
        matchmaker.enqueue(request).await.unwrap();

        let player = matchmaker.players.get("p1").await.unwrap().unwrap();
        assert_eq!(player.status, PlayerStatus::Queued);
        assert_eq!(player.region, "US");
        assert!(player.game_server.is_none());
        assert!(player.matched_time.is_none());
        assert!(player.joined_time.is_none());

        let server = matchmaker.game_servers.get(&server_id).await.unwrap().unwrap();
        assert!(!server.has_member("p1"));
    }

    #[tokio::test]
    async fn test_assigned_player_ids() {
        let settings = MatchmakingSettings {
            assign_player_ids: true,
            ..MatchmakingSettings::default()
        };
        let (matchmaker, _clock) = engine_with(settings);

        let receipt = matchmaker.enqueue(enqueue_request("")).await.unwrap();
        assert_eq!(receipt.player_id, "id-1");
        assert!(matchmaker.players.get("id-1").await.unwrap().is_some());

        // Caller-supplied ids still win
        let receipt = matchmaker.enqueue(enqueue_request("p9")).await.unwrap();
        assert_eq!(receipt.player_id, "p9");
    }

    #[tokio::test]
    async fn test_dequeue() {
        let (matchmaker, _clock) = engine();
        matchmaker.enqueue(enqueue_request("p1")).await.unwrap();

        assert_eq!(matchmaker.dequeue("p1").await.unwrap(), "p1");
        assert!(matchmaker.players.get("p1").await.unwrap().is_none());

        let err = matchmaker.dequeue("p1").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MatchmakingError>(),
            Some(MatchmakingError::NotFound {
                entity: Entity::Player,
                ..
            })
        ));

        let err = matchmaker.dequeue("").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<MatchmakingError>().and_then(|e| e.code()),
            Some(107)
        );
    }

    #[tokio::test]
    async fn test_dequeue_of_matched_player_frees_seat() {
        let (matchmaker, _clock) = engine();
        let server_id = matchmaker
            .register(registration("1.2.3.4", 8888, 1))
            .await
            .unwrap();
        matchmaker.enqueue(enqueue_request("p1")).await.unwrap();
        matchmaker.poll_matchmaking("p1").await.unwrap();

        matchmaker.dequeue("p1").await.unwrap();

        let server = matchmaker.game_servers.get(&server_id).await.unwrap().unwrap();
        assert!(server.players.is_empty());
    }
}
