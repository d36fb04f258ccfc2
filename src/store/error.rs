//! Storage error types

use thiserror::Error;

use crate::types::Timestamp;

/// Errors from the sample store and its durable logs
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// History query with `start > end`; storage was not touched
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: Timestamp, end: Timestamp },

    /// The durable log cannot be reached
    #[error("storage unavailable: {reason}")]
    Unavailable { reason: String },

    /// A row for this channel and timestamp is already logged
    #[error("duplicate timestamp {timestamp} for channel {channel}")]
    DuplicateTimestamp { channel: String, timestamp: Timestamp },

    /// Reading names a channel the log has no table for
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Client-side mistakes as opposed to storage faults
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRange { .. })
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
