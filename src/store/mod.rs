//! Record storage for game servers and players
//!
//! The engine only needs keyed lookups, upserts, deletes and scans. Each
//! entity kind gets its own port so a deployment can back them with any
//! key-value store; the in-memory implementations here are the default.

pub mod game_server;
pub mod player;

pub use game_server::{GameServerStore, InMemoryGameServerStore};
pub use player::{InMemoryPlayerStore, PlayerStore};

use crate::error::{MatchmakingError, Result};
use crate::types::{GameServer, Player};
use std::collections::HashMap;
use std::sync::RwLock;

/// A record addressable by a string key
pub trait Keyed: Clone {
    fn key(&self) -> &str;
}

impl Keyed for GameServer {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Player {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Lock-protected map shared by the in-memory stores
#[derive(Debug)]
pub(crate) struct Table<T> {
    name: &'static str,
    rows: RwLock<HashMap<String, T>>,
}

impl<T: Keyed> Table<T> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            rows: RwLock::new(HashMap::new()),
        }
    }

    fn poisoned(&self, access: &str) -> MatchmakingError {
        MatchmakingError::Storage {
            message: format!("Failed to acquire {} {} lock", self.name, access),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Result<Option<T>> {
        let rows = self.rows.read().map_err(|_| self.poisoned("read"))?;
        Ok(rows.get(key).cloned())
    }

    pub(crate) fn put(&self, record: T) -> Result<()> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned("write"))?;
        rows.insert(record.key().to_string(), record);
        Ok(())
    }

    pub(crate) fn delete(&self, key: &str) -> Result<bool> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned("write"))?;
        Ok(rows.remove(key).is_some())
    }

    /// Matching rows, ordered by key so scans are deterministic
    pub(crate) fn filter(&self, predicate: impl Fn(&T) -> bool) -> Result<Vec<T>> {
        let rows = self.rows.read().map_err(|_| self.poisoned("read"))?;
        let mut matching: Vec<T> = rows.values().filter(|row| predicate(row)).cloned().collect();
        matching.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(matching)
    }

    pub(crate) fn len(&self) -> Result<usize> {
        let rows = self.rows.read().map_err(|_| self.poisoned("read"))?;
        Ok(rows.len())
    }
}
