//! Core types for readings, identifiers and configuration values

pub mod config;
pub mod reading;
pub mod validated;

pub use config::{BaudRate, Port, ThreadCount, duration_serde};
pub use reading::{Reading, Timestamp, unix_now};
pub use validated::{ChannelName, HostName, ValidationError};

use uuid::Uuid;

/// Unique identifier for client connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Generate a new unique client ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
