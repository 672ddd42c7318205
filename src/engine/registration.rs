//! Server registration, heartbeat and status management

use super::Matchmaker;
use crate::error::{require, Field, Result};
use crate::types::{GameServer, RegisterServer, ServerId, ServerStatus};
use tracing::{debug, info, warn};

impl Matchmaker {
    /// Register a game server, reusing the id of any server already at the
    /// same address and port.
    ///
    /// A reused server gets every field overwritten, its membership emptied
    /// and its status forced to `OPEN`. Players still pointing at it keep
    /// their reference until a poll or a leave notification reconciles them.
    pub async fn register(&self, request: RegisterServer) -> Result<ServerId> {
        require(&request.game_mode, Field::GameMode)?;
        require(&request.address, Field::Address)?;
        require(&request.region, Field::Region)?;
        require(&request.version, Field::Version)?;

        let _guard = self.op_lock.lock().await;
        let now = self.clock.now();

        let existing = self
            .game_servers
            .find_by_endpoint(&request.address, request.port)
            .await?;
        let reregistered = existing.is_some();

        let server = match existing {
            Some(mut server) => {
                if !server.players.is_empty() {
                    warn!(
                        "Re-registration of server {} drops {} member(s) whose records still reference it",
                        server.id,
                        server.occupancy()
                    );
                }
                server.apply_registration(&request, now);
                server
            }
            None => GameServer::from_registration(self.ids.generate(), &request, now),
        };

        let server_id = server.id.clone();
        self.game_servers.put(server).await?;
        self.metrics_collector.record_server_registered(reregistered);

        info!(
            "Registered server {} at {}:{} - mode: {}, region: {}, version: {}, capacity: {}, reused: {}",
            server_id,
            request.address,
            request.port,
            request.game_mode,
            request.region,
            request.version,
            request.max_players,
            reregistered
        );
        Ok(server_id)
    }

    /// Remove a server. Member players are reconciled by the next poll.
    pub async fn deregister(&self, server_id: &str) -> Result<ServerId> {
        require(server_id, Field::GameServerId)?;

        let _guard = self.op_lock.lock().await;
        let server = self.existing_server(server_id).await?;
        self.game_servers.delete(&server.id).await?;
        self.metrics_collector.record_server_deregistered();

        info!(
            "Deregistered server {} ({} member(s) left dangling)",
            server.id,
            server.occupancy()
        );
        Ok(server.id)
    }

    /// Refresh a server's heartbeat
    pub async fn heartbeat(&self, server_id: &str) -> Result<ServerId> {
        require(server_id, Field::GameServerId)?;

        let _guard = self.op_lock.lock().await;
        let mut server = self.existing_server(server_id).await?;
        server.last_heartbeat = self.clock.now();
        let server_id = server.id.clone();
        self.game_servers.put(server).await?;

        debug!("Heartbeat from server {}", server_id);
        Ok(server_id)
    }

    /// Open or close a server for allocation without deregistering it
    pub async fn set_status(&self, server_id: &str, status: ServerStatus) -> Result<GameServer> {
        require(server_id, Field::GameServerId)?;

        let _guard = self.op_lock.lock().await;
        let mut server = self.existing_server(server_id).await?;
        server.status = status;
        self.game_servers.put(server.clone()).await?;

        info!("Server {} is now {}", server.id, status);
        Ok(server)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::Matchmaker;
    use crate::clock::{Clock, MockClock};
    use crate::config::MatchmakingSettings;
    use crate::error::{Entity, Field, MatchmakingError};
    use crate::ids::MockIdGenerator;
    use crate::metrics::MetricsCollector;
    use crate::store::{InMemoryGameServerStore, InMemoryPlayerStore};
    use crate::types::ServerStatus;
    use chrono::Utc;
    use std::sync::Arc;

    fn validation_field(err: &anyhow::Error) -> Option<Field> {
        match err.downcast_ref::<MatchmakingError>() {
            Some(MatchmakingError::Validation { field }) => Some(*field),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_register_validates_fields_in_order() {
        let (matchmaker, _clock) = engine();

        let mut request = registration("", 8888, 2);
        request.game_mode.clear();
        request.region.clear();
        let err = matchmaker.register(request).await.unwrap_err();
        assert_eq!(validation_field(&err), Some(Field::GameMode));

        let mut request = registration("", 8888, 2);
        request.region.clear();
        let err = matchmaker.register(request).await.unwrap_err();
        assert_eq!(validation_field(&err), Some(Field::Address));

        let mut request = registration("1.2.3.4", 8888, 2);
        request.region.clear();
        request.version.clear();
        let err = matchmaker.register(request).await.unwrap_err();
        assert_eq!(validation_field(&err), Some(Field::Region));

        let mut request = registration("1.2.3.4", 8888, 2);
        request.version.clear();
        let err = matchmaker.register(request).await.unwrap_err();
        assert_eq!(validation_field(&err), Some(Field::Version));

        assert!(matchmaker.list_servers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_creates_open_server() {
        let (matchmaker, clock) = engine();
        let id = matchmaker
            .register(registration("1.2.3.4", 8888, 2))
            .await
            .unwrap();
        assert!(!id.is_empty());

        let server = matchmaker.game_servers.get(&id).await.unwrap().unwrap();
        assert_eq!(server.status, ServerStatus::Open);
        assert_eq!(server.last_heartbeat, clock.now());
        assert_eq!(server.max_players, 2);
    }

    #[tokio::test]
    async fn test_reregistration_reuses_id_and_resets_membership() {
        let mut ids = MockIdGenerator::new();
        ids.expect_generate()
            .times(1)
            .returning(|| "server-a".to_string());
        let mut clock = MockClock::new();
        clock.expect_now().returning(Utc::now);

        let matchmaker = Matchmaker::with_components(
            Arc::new(InMemoryGameServerStore::new()),
            Arc::new(InMemoryPlayerStore::new()),
            Arc::new(clock),
            Arc::new(ids),
            MatchmakingSettings::default(),
            Arc::new(MetricsCollector::default()),
        );

        let first = matchmaker
            .register(registration("1.2.3.4", 8888, 2))
            .await
            .unwrap();
        matchmaker.enqueue(enqueue_request("p1")).await.unwrap();
        matchmaker.poll_matchmaking("p1").await.unwrap();
        matchmaker
            .set_status(&first, ServerStatus::Closed)
            .await
            .unwrap();

        let mut changed = registration("1.2.3.4", 8888, 6);
        changed.game_mode = "CTF".to_string();
        let second = matchmaker.register(changed).await.unwrap();

        assert_eq!(first, "server-a");
        assert_eq!(first, second);
        let server = matchmaker.game_servers.get(&second).await.unwrap().unwrap();
        assert!(server.players.is_empty());
        assert_eq!(server.status, ServerStatus::Open);
        assert_eq!(server.game_mode, "CTF");
        assert_eq!(server.max_players, 6);

        let metrics = matchmaker.metrics();
        let registrations = &metrics.server().registrations_total;
        assert_eq!(registrations.with_label_values(&["new"]).get(), 1);
        assert_eq!(registrations.with_label_values(&["reregistered"]).get(), 1);
    }

    #[tokio::test]
    async fn test_same_address_different_port_is_a_new_server() {
        let (matchmaker, _clock) = engine();
        let a = matchmaker
            .register(registration("1.2.3.4", 8888, 2))
            .await
            .unwrap();
        let b = matchmaker
            .register(registration("1.2.3.4", 8889, 2))
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_heartbeat_refreshes_timestamp_only() {
        let (matchmaker, clock) = engine();
        let id = matchmaker
            .register(registration("1.2.3.4", 8888, 2))
            .await
            .unwrap();
        matchmaker
            .set_status(&id, ServerStatus::Closed)
            .await
            .unwrap();

        clock.advance_seconds(30);
        assert_eq!(matchmaker.heartbeat(&id).await.unwrap(), id);

        let server = matchmaker.game_servers.get(&id).await.unwrap().unwrap();
        assert_eq!(server.last_heartbeat, clock.now());
        assert_eq!(server.status, ServerStatus::Closed);
    }

    #[tokio::test]
    async fn test_server_id_operations_report_missing_and_unknown() {
        let (matchmaker, _clock) = engine();

        let err = matchmaker.heartbeat("").await.unwrap_err();
        assert_eq!(validation_field(&err), Some(Field::GameServerId));
        let err = matchmaker.deregister("").await.unwrap_err();
        assert_eq!(validation_field(&err), Some(Field::GameServerId));

        for err in [
            matchmaker.heartbeat("nope").await.unwrap_err(),
            matchmaker.deregister("nope").await.unwrap_err(),
            matchmaker
                .set_status("nope", ServerStatus::Open)
                .await
                .unwrap_err(),
        ] {
            assert!(matches!(
                err.downcast_ref::<MatchmakingError>(),
                Some(MatchmakingError::NotFound {
                    entity: Entity::GameServer,
                    ..
                })
            ));
        }
    }

    #[tokio::test]
    async fn test_deregister_removes_server() {
        let (matchmaker, _clock) = engine();
        let id = matchmaker
            .register(registration("1.2.3.4", 8888, 2))
            .await
            .unwrap();

        assert_eq!(matchmaker.deregister(&id).await.unwrap(), id);
        assert!(matchmaker.game_servers.get(&id).await.unwrap().is_none());
        assert_eq!(
            matchmaker.metrics().server().deregistrations_total.get(),
            1
        );
    }
}
