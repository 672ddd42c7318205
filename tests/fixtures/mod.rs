//! Test fixtures and failure-injecting stores for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use matchmaker::config::MatchmakingSettings;
use matchmaker::error::{MatchmakingError, Result};
use matchmaker::metrics::MetricsCollector;
use matchmaker::store::game_server::ServerPredicate;
use matchmaker::store::player::PlayerPredicate;
use matchmaker::types::{EnqueuePlayer, GameServer, Player, RegisterServer};
use matchmaker::{
    GameServerStore, InMemoryGameServerStore, InMemoryPlayerStore, ManualClock, Matchmaker,
    PlayerStore, SequentialIdGenerator,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A complete engine with handles on its time source and stores
pub struct TestSystem {
    pub matchmaker: Matchmaker,
    pub clock: ManualClock,
    pub game_servers: Arc<FlakyGameServerStore>,
    pub players: Arc<FlakyPlayerStore>,
    pub failures: Arc<FailureFlags>,
}

pub fn create_test_system() -> TestSystem {
    create_test_system_with(MatchmakingSettings::default())
}

pub fn create_test_system_with(settings: MatchmakingSettings) -> TestSystem {
    let clock = ManualClock::starting_now();
    let failures = Arc::new(FailureFlags::default());
    let game_servers = Arc::new(FlakyGameServerStore::new(failures.clone()));
    let players = Arc::new(FlakyPlayerStore::new(failures.clone()));

    let matchmaker = Matchmaker::with_components(
        game_servers.clone(),
        players.clone(),
        Arc::new(clock.clone()),
        Arc::new(SequentialIdGenerator::new("server")),
        settings,
        Arc::new(MetricsCollector::default()),
    );

    TestSystem {
        matchmaker,
        clock,
        game_servers,
        players,
        failures,
    }
}

pub fn register_request(address: &str, port: u16, max_players: u32) -> RegisterServer {
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

/// Switches that make the flaky stores fail
#[derive(Debug, Default)]
pub struct FailureFlags {
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FailureFlags {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(MatchmakingError::Storage {
                message: "injected read failure".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MatchmakingError::Storage {
                message: "injected write failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// In-memory server store that fails on demand
pub struct FlakyGameServerStore {
    inner: InMemoryGameServerStore,
    failures: Arc<FailureFlags>,
}

impl FlakyGameServerStore {
    pub fn new(failures: Arc<FailureFlags>) -> Self {
        Self {
            inner: InMemoryGameServerStore::new(),
            failures,
        }
    }
}

#[async_trait]
impl GameServerStore for FlakyGameServerStore {
    async fn get(&self, id: &str) -> Result<Option<GameServer>> {
        self.failures.check_read()?;
        self.inner.get(id).await
    }

    async fn put(&self, server: GameServer) -> Result<()> {
        self.failures.check_write()?;
        self.inner.put(server).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.failures.check_write()?;
        self.inner.delete(id).await
    }

    async fn list_all(&self) -> Result<Vec<GameServer>> {
        self.failures.check_read()?;
        self.inner.list_all().await
    }

    async fn find_by(&self, predicate: ServerPredicate<'_>) -> Result<Vec<GameServer>> {
        self.failures.check_read()?;
        self.inner.find_by(predicate).await
    }
}

/// In-memory player store that fails on demand
pub struct FlakyPlayerStore {
    inner: InMemoryPlayerStore,
    failures: Arc<FailureFlags>,
}

impl FlakyPlayerStore {
    pub fn new(failures: Arc<FailureFlags>) -> Self {
        Self {
            inner: InMemoryPlayerStore::new(),
            failures,
        }
    }
}

#[async_trait]
impl PlayerStore for FlakyPlayerStore {
    async fn get(&self, id: &str) -> Result<Option<Player>> {
        self.failures.check_read()?;
        self.inner.get(id).await
    }

    async fn put(&self, player: Player) -> Result<()> {
        self.failures.check_write()?;
        self.inner.put(player).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.failures.check_write()?;
        self.inner.delete(id).await
    }

    async fn list_all(&self) -> Result<Vec<Player>> {
        self.failures.check_read()?;
        self.inner.list_all().await
    }

    async fn find_by(&self, predicate: PlayerPredicate<'_>) -> Result<Vec<Player>> {
        self.failures.check_read()?;
        self.inner.find_by(predicate).await
    }
}
