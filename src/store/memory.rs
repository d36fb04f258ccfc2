//! In-memory sample log

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::types::{ChannelName, Reading, Timestamp};

use super::{SampleLog, StoreError, StoreResult};

/// Volatile [`SampleLog`] keeping per-channel ordered maps
///
/// Follows the SQLite log's rules (one row per channel and timestamp, whole
/// reading or nothing) so it can stand in for it in tests and on boards
/// without persistent storage. [`set_offline`](Self::set_offline) makes every
/// call fail with [`StoreError::Unavailable`].
#[derive(Debug, Default)]
pub struct MemoryLog {
    rows: Mutex<HashMap<String, BTreeMap<Timestamp, f64>>>,
    offline: AtomicBool,
}

impl MemoryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) the storage backend
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Total rows across all channels
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.lock()
            .map(|rows| rows.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<String, BTreeMap<Timestamp, f64>>>> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(StoreError::unavailable("memory log is offline"));
        }
        self.rows
            .lock()
            .map_err(|_| StoreError::unavailable("memory log lock poisoned"))
    }
}

impl SampleLog for MemoryLog {
    fn append(&self, reading: &Reading) -> StoreResult<()> {
        let mut rows = self.lock()?;

        let timestamp = reading.timestamp();
        if let Some((channel, _)) = reading.values().iter().find(|(channel, _)| {
            rows.get(channel.as_str())
                .is_some_and(|series| series.contains_key(&timestamp))
        }) {
            return Err(StoreError::DuplicateTimestamp {
                channel: channel.to_string(),
                timestamp,
            });
        }

        for (channel, value) in reading.values() {
            rows.entry(channel.to_string())
                .or_default()
                .insert(timestamp, *value);
        }
        Ok(())
    }

    fn scan(
        &self,
        channel: &ChannelName,
        start: Timestamp,
        end: Timestamp,
    ) -> StoreResult<Vec<(Timestamp, f64)>> {
        let rows = self.lock()?;
        Ok(scan_series(&rows, channel, start, end))
    }

    fn scan_range(
        &self,
        channels: &[ChannelName],
        start: Timestamp,
        end: Timestamp,
    ) -> StoreResult<Vec<Vec<(Timestamp, f64)>>> {
        let rows = self.lock()?;
        Ok(channels
            .iter()
            .map(|channel| scan_series(&rows, channel, start, end))
            .collect())
    }
}

fn scan_series(
    rows: &HashMap<String, BTreeMap<Timestamp, f64>>,
    channel: &ChannelName,
    start: Timestamp,
    end: Timestamp,
) -> Vec<(Timestamp, f64)> {
    if start > end {
        return Vec::new();
    }
    rows.get(channel.as_str())
        .map(|series| {
            series
                .range(start..=end)
                .map(|(time, value)| (*time, *value))
                .collect()
        })
        .unwrap_or_default()
}
