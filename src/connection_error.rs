//! Connection error types for client sessions
//!
//! Any of these is fatal to the one connection it occurred on; the handler is
//! removed from the registry and closed.

use std::fmt;

/// Errors that end a client connection
#[derive(Debug)]
#[non_exhaustive]
pub enum ConnectionError {
    /// Writing an outbound line failed
    Write {
        peer: String,
        source: std::io::Error,
    },

    /// Reading from the client failed
    Read {
        peer: String,
        source: std::io::Error,
    },

    /// The connection was already closed
    Closed { peer: String },
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write { peer, source } => {
                write!(f, "Failed to write to client {}: {}", peer, source)
            }
            Self::Read { peer, source } => {
                write!(f, "Failed to read from client {}: {}", peer, source)
            }
            Self::Closed { peer } => write!(f, "Connection to client {} is closed", peer),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Write { source, .. } | Self::Read { source, .. } => Some(source),
            Self::Closed { .. } => None,
        }
    }
}

impl ConnectionError {
    /// Check if this is the client going away (broken pipe, reset, closed)
    #[must_use]
    pub fn is_client_disconnect(&self) -> bool {
        match self {
            Self::Write { source, .. } | Self::Read { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::UnexpectedEof
            ),
            Self::Closed { .. } => true,
        }
    }

    /// Get the appropriate log level for this error
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.is_client_disconnect() {
            // Clients leaving mid-stream is normal
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }
}
