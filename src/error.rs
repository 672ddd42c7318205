//! Error types for the matchmaking service
//!
//! Caller errors are raised as [`MatchmakingError`] and travel inside
//! `anyhow::Error`, so store failures of any shape propagate unchanged while
//! the HTTP edge can still recover the typed variant with `downcast_ref`.

use std::fmt;

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Required request fields, in the order operations validate them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    GameMode,
    Address,
    Region,
    Version,
    GameServerId,
    PlayerId,
}

impl Field {
    /// Public error code reported when this field is missing
    pub fn code(self) -> u16 {
        match self {
            Field::GameMode => 100,
            Field::Address => 101,
            Field::Region => 103,
            Field::Version => 104,
            Field::GameServerId => 105,
            Field::PlayerId => 107,
        }
    }

    fn missing_message(self) -> &'static str {
        match self {
            Field::GameMode => "Missing game mode.",
            Field::Address => "Missing IPv4 address.",
            Field::Region => "Missing region.",
            Field::Version => "Missing version.",
            Field::GameServerId => "Missing game server id.",
            Field::PlayerId => "Missing player id.",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.missing_message())
    }
}

/// Kind of record a lookup missed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    GameServer,
    Player,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::GameServer => write!(f, "Game server"),
            Entity::Player => write!(f, "Player"),
        }
    }
}

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, thiserror::Error)]
pub enum MatchmakingError {
    #[error("{field}")]
    Validation { field: Field },

    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    #[error("Player {player_id} not found for server {server_id}")]
    PlayerNotFoundForServer {
        server_id: String,
        player_id: String,
    },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl MatchmakingError {
    pub fn missing(field: Field) -> Self {
        MatchmakingError::Validation { field }
    }

    pub fn server_not_found(id: impl Into<String>) -> Self {
        MatchmakingError::NotFound {
            entity: Entity::GameServer,
            id: id.into(),
        }
    }

    pub fn player_not_found(id: impl Into<String>) -> Self {
        MatchmakingError::NotFound {
            entity: Entity::Player,
            id: id.into(),
        }
    }

    /// Public error code, if this is a caller error
    pub fn code(&self) -> Option<u16> {
        match self {
            MatchmakingError::Validation { field } => Some(field.code()),
            MatchmakingError::NotFound {
                entity: Entity::GameServer,
                ..
            } => Some(106),
            MatchmakingError::NotFound {
                entity: Entity::Player,
                ..
            } => Some(108),
            MatchmakingError::PlayerNotFoundForServer { .. } => Some(109),
            MatchmakingError::Storage { .. } | MatchmakingError::Configuration { .. } => None,
        }
    }

    /// Whether the caller, not the service, is at fault
    pub fn is_caller_error(&self) -> bool {
        self.code().is_some()
    }
}

/// Fail with a validation error if `value` is empty
pub fn require(value: &str, field: Field) -> Result<()> {
    if value.is_empty() {
        return Err(MatchmakingError::missing(field).into());
    }
    Ok(())
}
