//! Broadcast loop
//!
//! Once per period the loop takes a snapshot of the registry and of the
//! current reading, then serves each connection according to its mode:
//! real-time connections get one `r` line, connections with a pending history
//! request get a full paced replay. Replays run inline, so the connections
//! after a replaying one wait for it within the same tick.

mod replay;

pub use replay::{ReplayOutcome, replay, replay_delay};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::connection_error::ConnectionError;
use crate::protocol::LineEncoder;
use crate::session::{ConnectionHandler, ConnectionRegistry, StreamMode};
use crate::store::SampleStore;
use crate::types::BaudRate;

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// No reading was available yet; nothing was sent
    pub skipped: bool,
    pub real_time_sent: usize,
    pub replays: usize,
    /// Connections removed after a write failure
    pub dropped: usize,
}

/// Periodic fan-out of readings and history replays
pub struct BroadcastLoop {
    registry: Arc<ConnectionRegistry>,
    store: Arc<SampleStore>,
    encoder: LineEncoder,
    baud: BaudRate,
    period: Duration,
}

impl BroadcastLoop {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        store: Arc<SampleStore>,
        encoder: LineEncoder,
        baud: BaudRate,
        period: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            encoder,
            baud,
            period,
        }
    }

    /// Serve every live connection once
    pub async fn tick(&self) -> TickSummary {
        let mut summary = TickSummary::default();
        let handlers = self.registry.snapshot();
        let Some(reading) = self.store.snapshot() else {
            summary.skipped = true;
            return summary;
        };

        for handler in handlers {
            // Gone since the snapshot was taken
            if !self.registry.contains(&handler.id()) {
                continue;
            }

            let result = match handler.mode().mode() {
                StreamMode::RealTime => {
                    let sent = handler.send_line(&self.encoder.real_time(&reading)).await;
                    if sent.is_ok() {
                        summary.real_time_sent += 1;
                    }
                    sent
                }
                StreamMode::HistoryPending(_) => match handler.mode().begin_replay() {
                    Some(range) => {
                        summary.replays += 1;
                        let outcome =
                            replay(&handler, &self.store, &self.encoder, self.baud, range).await;
                        handler.mode().finish_replay();
                        outcome.map(|_| ())
                    }
                    None => Ok(()),
                },
                StreamMode::Idle | StreamMode::HistoryStreaming => Ok(()),
            };

            if let Err(e) = result
                && self.drop_connection(&handler, &e).await
            {
                summary.dropped += 1;
            }
        }

        summary
    }

    /// Remove and close a connection after a write failure
    ///
    /// Returns false if another path already removed it.
    async fn drop_connection(&self, handler: &ConnectionHandler, error: &ConnectionError) -> bool {
        if error.log_level() == tracing::Level::DEBUG {
            debug!("Dropping client {}: {}", handler.peer(), error);
        } else {
            warn!("Dropping client {}: {}", handler.peer(), error);
        }

        if self.registry.remove(&handler.id()).is_some() {
            handler.close().await;
            true
        } else {
            false
        }
    }

    /// Tick every period until shutdown is signalled
    ///
    /// Shutdown is observed between ticks; a replay in progress runs to
    /// completion first.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Broadcasting {} readings every {:?} (link {} baud)",
            self.encoder.format(),
            self.period,
            self.baud
        );

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait_for(|stop| *stop) => break,
                _ = interval.tick() => {}
            }

            let summary = self.tick().await;
            if !summary.skipped {
                debug!(
                    live = self.registry.len(),
                    real_time = summary.real_time_sent,
                    replays = summary.replays,
                    dropped = summary.dropped,
                    "Broadcast tick"
                );
            }
        }

        info!("Broadcast loop stopped");
    }
}
