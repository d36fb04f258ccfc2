//! Sample store
//!
//! [`SampleStore`] holds the most recent [`Reading`] for the broadcast loop
//! and appends every published reading to a durable [`SampleLog`]. The
//! current-reading slot never waits on storage: durable writes and history
//! queries run on the blocking pool.

mod error;
mod memory;
mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryLog;
pub use sqlite::SqliteLog;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::types::{ChannelName, Reading, Timestamp};

/// Durable per-channel sample storage
///
/// Implementations are synchronous; [`SampleStore`] calls them from
/// `spawn_blocking`.
pub trait SampleLog: Send + Sync {
    /// Persist every channel of `reading` in one all-or-nothing group
    fn append(&self, reading: &Reading) -> StoreResult<()>;

    /// Rows of one channel with `start <= time <= end`, ascending by time
    fn scan(
        &self,
        channel: &ChannelName,
        start: Timestamp,
        end: Timestamp,
    ) -> StoreResult<Vec<(Timestamp, f64)>>;

    /// Rows of every channel in `channels` with `start <= time <= end`
    ///
    /// All channels are read from one consistent view, so a reading appended
    /// concurrently is seen either whole or not at all. `result[i]` holds the
    /// rows of `channels[i]`.
    fn scan_range(
        &self,
        channels: &[ChannelName],
        start: Timestamp,
        end: Timestamp,
    ) -> StoreResult<Vec<Vec<(Timestamp, f64)>>>;
}

/// Latest reading plus durable history
pub struct SampleStore {
    current: Mutex<Option<Arc<Reading>>>,
    log: Arc<dyn SampleLog>,
    channels: Arc<[ChannelName]>,
}

impl std::fmt::Debug for SampleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleStore")
            .field("channels", &self.channels)
            .field("current", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl SampleStore {
    pub fn new(log: Arc<dyn SampleLog>, channels: Arc<[ChannelName]>) -> Self {
        Self {
            current: Mutex::new(None),
            log,
            channels,
        }
    }

    /// Configured channels, in column order
    #[must_use]
    pub fn channels(&self) -> &Arc<[ChannelName]> {
        &self.channels
    }

    /// Make `reading` current, then append it to the durable log
    ///
    /// The current slot is updated before the durable write, so the reading
    /// is broadcast even when persisting it fails.
    pub async fn publish(&self, reading: Reading) -> StoreResult<Arc<Reading>> {
        let reading = Arc::new(reading);
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(reading.clone());

        let log = self.log.clone();
        let row = reading.clone();
        tokio::task::spawn_blocking(move || log.append(&row))
            .await
            .map_err(|e| StoreError::unavailable(format!("log writer task failed: {}", e)))??;

        Ok(reading)
    }

    /// Most recently published reading, `None` before the first publish
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Reading>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Logged readings with `start <= time <= end`, ascending by time
    ///
    /// One [`Reading`] per timestamp, holding the channels logged at that
    /// time in configured order.
    pub async fn query_range(&self, start: Timestamp, end: Timestamp) -> StoreResult<Vec<Reading>> {
        if start > end {
            return Err(StoreError::InvalidRange { start, end });
        }

        let log = self.log.clone();
        let channels = self.channels.clone();
        tokio::task::spawn_blocking(move || -> StoreResult<Vec<Reading>> {
            let per_channel = log.scan_range(&channels, start, end)?;
            Ok(merge_channel_rows(&channels, per_channel))
        })
        .await
        .map_err(|e| StoreError::unavailable(format!("history query task failed: {}", e)))?
    }
}

/// Join per-channel row lists into one reading per timestamp
///
/// `per_channel[i]` holds the rows of `channels[i]`. Output is ascending by
/// timestamp; each reading lists its channels in `channels` order and omits
/// channels with no row at that timestamp.
#[must_use]
pub fn merge_channel_rows(
    channels: &[ChannelName],
    per_channel: Vec<Vec<(Timestamp, f64)>>,
) -> Vec<Reading> {
    let mut by_time: BTreeMap<Timestamp, Vec<(ChannelName, f64)>> = BTreeMap::new();
    for (channel, rows) in channels.iter().zip(per_channel) {
        for (time, value) in rows {
            by_time
                .entry(time)
                .or_default()
                .push((channel.clone(), value));
        }
    }
    by_time
        .into_iter()
        .map(|(time, values)| Reading::new(time, values))
        .collect()
}
