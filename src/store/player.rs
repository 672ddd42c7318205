//! Player storage port and in-memory implementation

use crate::error::Result;
use crate::store::Table;
use crate::types::Player;
use async_trait::async_trait;

/// Predicate used by [`PlayerStore::find_by`]
pub type PlayerPredicate<'a> = &'a (dyn Fn(&Player) -> bool + Send + Sync);

/// Trait for player storage operations
#[async_trait]
pub trait PlayerStore: Send + Sync {
    /// Get a player by id
    async fn get(&self, id: &str) -> Result<Option<Player>>;

    /// Insert or replace a player record
    async fn put(&self, player: Player) -> Result<()>;

    /// Remove a player; returns whether it existed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// All players
    async fn list_all(&self) -> Result<Vec<Player>>;

    /// Players matching `predicate`
    async fn find_by(&self, predicate: PlayerPredicate<'_>) -> Result<Vec<Player>>;
}

/// In-memory player storage
#[derive(Debug)]
pub struct InMemoryPlayerStore {
    table: Table<Player>,
}

impl InMemoryPlayerStore {
    pub fn new() -> Self {
        Self {
            table: Table::new("players"),
        }
    }

    /// Number of stored players
    pub fn len(&self) -> Result<usize> {
        self.table.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryPlayerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayerStore for InMemoryPlayerStore {
    async fn get(&self, id: &str) -> Result<Option<Player>> {
        self.table.get(id)
    }

    async fn put(&self, player: Player) -> Result<()> {
        self.table.put(player)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.table.delete(id)
    }

    async fn list_all(&self) -> Result<Vec<Player>> {
        self.table.filter(|_| true)
    }

    async fn find_by(&self, predicate: PlayerPredicate<'_>) -> Result<Vec<Player>> {
        self.table.filter(|player| predicate(player))
    }
}
