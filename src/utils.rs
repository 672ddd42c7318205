//! Utility functions for the matchmaking service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique identifier string
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}
