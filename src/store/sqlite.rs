//! SQLite sample log
//!
//! One table per channel:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS <channel> (time INTEGER PRIMARY KEY NOT NULL, value REAL)
//! ```
//!
//! Channel names are validated identifiers, so they are interpolated into SQL
//! as quoted table names; values always go through bound parameters.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, ErrorCode, params};
use tracing::{debug, info, warn};

use crate::types::{ChannelName, Reading, Timestamp};

use super::{SampleLog, StoreError, StoreResult};

/// SQLite-backed [`SampleLog`]
///
/// The connection is shared behind a mutex and used from the blocking pool.
/// Dropping the log checkpoints the WAL and closes the database.
pub struct SqliteLog {
    conn: Mutex<Connection>,
    tables: HashSet<String>,
}

impl std::fmt::Debug for SqliteLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLog")
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}

impl SqliteLog {
    /// Open or create a database file with a table for each channel
    pub fn open<P: AsRef<Path>>(path: P, channels: &[ChannelName]) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        info!(
            "Opened sample database {} ({} channels)",
            path.as_ref().display(),
            channels.len()
        );
        Self::with_connection(conn, channels)
    }

    /// In-memory database, for tests and benchmarks
    pub fn open_in_memory(channels: &[ChannelName]) -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, channels)
    }

    fn with_connection(conn: Connection, channels: &[ChannelName]) -> StoreResult<Self> {
        for channel in channels {
            conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS \"{}\" (time INTEGER PRIMARY KEY NOT NULL, value REAL)",
                    channel
                ),
                [],
            )?;
        }
        Ok(Self {
            conn: Mutex::new(conn),
            tables: channels.iter().map(|c| c.to_string()).collect(),
        })
    }

    fn check_table(&self, channel: &ChannelName) -> StoreResult<()> {
        if self.tables.contains(channel.as_str()) {
            Ok(())
        } else {
            Err(StoreError::UnknownChannel(channel.to_string()))
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::unavailable("database connection lock poisoned"))
    }
}

impl SampleLog for SqliteLog {
    fn append(&self, reading: &Reading) -> StoreResult<()> {
        if let Some((unknown, _)) = reading
            .values()
            .iter()
            .find(|(name, _)| !self.tables.contains(name.as_str()))
        {
            return Err(StoreError::UnknownChannel(unknown.to_string()));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for (channel, value) in reading.values() {
            let inserted = tx.execute(
                &format!("INSERT INTO \"{}\" (time, value) VALUES (?1, ?2)", channel),
                params![reading.timestamp(), value],
            );
            match inserted {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    // Dropping the transaction rolls back the channels already inserted
                    return Err(StoreError::DuplicateTimestamp {
                        channel: channel.to_string(),
                        timestamp: reading.timestamp(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn scan(
        &self,
        channel: &ChannelName,
        start: Timestamp,
        end: Timestamp,
    ) -> StoreResult<Vec<(Timestamp, f64)>> {
        self.check_table(channel)?;
        let conn = self.lock()?;
        scan_table(&conn, channel, start, end)
    }

    fn scan_range(
        &self,
        channels: &[ChannelName],
        start: Timestamp,
        end: Timestamp,
    ) -> StoreResult<Vec<Vec<(Timestamp, f64)>>> {
        for channel in channels {
            self.check_table(channel)?;
        }

        // One lock and one read transaction across every table
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let rows = channels
            .iter()
            .map(|channel| scan_table(&tx, channel, start, end))
            .collect::<StoreResult<Vec<_>>>()?;
        tx.finish()?;
        Ok(rows)
    }
}

fn scan_table(
    conn: &Connection,
    channel: &ChannelName,
    start: Timestamp,
    end: Timestamp,
) -> StoreResult<Vec<(Timestamp, f64)>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT time, value FROM \"{}\" WHERE time >= ?1 AND time <= ?2 ORDER BY time",
        channel
    ))?;
    let rows = stmt.query_map(params![start, end], |row| {
        Ok((row.get::<_, Timestamp>(0)?, row.get::<_, Option<f64>>(1)?))
    })?;

    let mut out = Vec::new();
    for row in rows {
        // NULL values are skipped; the channel reads as absent at that time
        if let (time, Some(value)) = row? {
            out.push((time, value));
        }
    }
    Ok(out)
}

impl Drop for SqliteLog {
    fn drop(&mut self) {
        let Ok(conn) = self.conn.get_mut() else {
            return;
        };
        match conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);") {
            Ok(()) => debug!("Sample database checkpointed"),
            Err(e) => warn!("Sample database checkpoint failed: {}", e),
        }
    }
}
