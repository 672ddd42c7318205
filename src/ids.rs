//! Identifier generation for game servers and server-assigned players

use crate::utils::generate_id;
use std::sync::atomic::{AtomicU64, Ordering};

/// Produces collision-free identifiers
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> String {
        generate_id()
    }
}

/// Predictable ids (`<prefix>-1`, `<prefix>-2`, ...) for tests and simulations
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_count_up() {
        let ids = SequentialIdGenerator::new("server");
        assert_eq!(ids.generate(), "server-1");
        assert_eq!(ids.generate(), "server-2");
    }

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids = UuidIdGenerator;
        assert_ne!(ids.generate(), ids.generate());
    }
}
