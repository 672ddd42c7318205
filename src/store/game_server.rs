//! Game server storage port and in-memory implementation

use crate::error::Result;
use crate::store::Table;
use crate::types::GameServer;
use async_trait::async_trait;

/// Predicate used by [`GameServerStore::find_by`]
pub type ServerPredicate<'a> = &'a (dyn Fn(&GameServer) -> bool + Send + Sync);

/// Trait for game server storage operations
#[async_trait]
pub trait GameServerStore: Send + Sync {
    /// Get a server by id
    async fn get(&self, id: &str) -> Result<Option<GameServer>>;

    /// Insert or replace a server record
    async fn put(&self, server: GameServer) -> Result<()>;

    /// Remove a server; returns whether it existed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// All servers
    async fn list_all(&self) -> Result<Vec<GameServer>>;

    /// Servers matching `predicate`
    async fn find_by(&self, predicate: ServerPredicate<'_>) -> Result<Vec<GameServer>>;

    /// The server registered at `address:port`, if any
    async fn find_by_endpoint(&self, address: &str, port: u16) -> Result<Option<GameServer>> {
        let matches = self
            .find_by(&|server: &GameServer| server.address == address && server.port == port)
            .await?;
        Ok(matches.into_iter().next())
    }
}

/// In-memory game server storage
#[derive(Debug)]
pub struct InMemoryGameServerStore {
    table: Table<GameServer>,
}

impl InMemoryGameServerStore {
    pub fn new() -> Self {
        Self {
            table: Table::new("game servers"),
        }
    }

    /// Number of stored servers
    pub fn len(&self) -> Result<usize> {
        self.table.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryGameServerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GameServerStore for InMemoryGameServerStore {
    async fn get(&self, id: &str) -> Result<Option<GameServer>> {
        self.table.get(id)
    }

    async fn put(&self, server: GameServer) -> Result<()> {
        self.table.put(server)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.table.delete(id)
    }

    async fn list_all(&self) -> Result<Vec<GameServer>> {
        self.table.filter(|_| true)
    }

    async fn find_by(&self, predicate: ServerPredicate<'_>) -> Result<Vec<GameServer>> {
        self.table.filter(|server| predicate(server))
    }
}
