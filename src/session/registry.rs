//! Live connection set
//!
//! The registry is written by connection tasks (register on accept, remove on
//! EOF) and by the broadcast loop (remove on write failure), and read by the
//! broadcast loop once per tick. Readers always iterate a collected snapshot,
//! never the map itself, so membership can change while a tick is running.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tracing::debug;

use crate::constants::timing::WRITE_TIMEOUT;
use crate::types::ClientId;

use super::ConnectionHandler;

#[derive(Debug)]
struct Entry {
    /// Accept order, for stable snapshot ordering
    seq: u64,
    handler: Arc<ConnectionHandler>,
}

/// Thread-safe set of live connections keyed by [`ClientId`]
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: DashMap<ClientId, Entry>,
    next_seq: AtomicU64,
    /// Applied to every connection accepted into this registry
    write_timeout: Duration,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::with_write_timeout(WRITE_TIMEOUT)
    }
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_write_timeout(write_timeout: Duration) -> Self {
        Self {
            connections: DashMap::new(),
            next_seq: AtomicU64::new(0),
            write_timeout,
        }
    }

    #[inline]
    #[must_use]
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Add a connection; returns its id
    pub fn register(&self, handler: Arc<ConnectionHandler>) -> ClientId {
        let id = handler.id();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.connections.insert(id, Entry { seq, handler });
        debug!(client_id = %id, live = self.connections.len(), "Registered connection");
        id
    }

    /// Remove a connection; `None` if it was already gone
    ///
    /// Exactly one caller gets `Some` for a given id, so whoever removes a
    /// connection owns closing it.
    pub fn remove(&self, id: &ClientId) -> Option<Arc<ConnectionHandler>> {
        self.connections.remove(id).map(|(_, entry)| entry.handler)
    }

    #[must_use]
    pub fn contains(&self, id: &ClientId) -> bool {
        self.connections.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Point-in-time list of live connections in accept order
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<ConnectionHandler>> {
        let mut entries: Vec<(u64, Arc<ConnectionHandler>)> = self
            .connections
            .iter()
            .map(|entry| (entry.seq, entry.handler.clone()))
            .collect();
        entries.sort_unstable_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, handler)| handler).collect()
    }

    /// Remove and close every connection; returns how many were closed
    pub async fn close_all(&self) -> usize {
        let handlers = self.snapshot();
        let mut closed = 0;
        for handler in handlers {
            if self.remove(&handler.id()).is_some() {
                handler.close().await;
                closed += 1;
            }
        }
        closed
    }
}
