//! Paced history replay
//!
//! Rows are written one at a time and each is followed by a pause long enough
//! for the radio link to drain it, so a long replay cannot overrun the
//! transport's buffers. After the last row an empty `h` line marks the end.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::connection_error::ConnectionError;
use crate::formatting::format_bytes;
use crate::protocol::{END_OF_REPLAY, HistoryRange, LineEncoder};
use crate::session::ConnectionHandler;
use crate::store::{SampleStore, StoreError};
use crate::types::BaudRate;

/// How a replay ended, when the connection survived it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// All rows and the end marker were written
    Completed { rows: usize, bytes: u64 },
    /// The range was inverted; nothing was written
    InvalidRange,
    /// Storage failed; nothing was written
    StorageFailed,
}

/// Pause after writing a line of `len` bytes: `1.1 * 8 * len / baud` seconds
#[must_use]
pub fn replay_delay(len: usize, baud: BaudRate) -> Duration {
    baud.pacing_delay(len)
}

/// Replay logged rows in `range` to one connection
///
/// Storage problems are logged and end the replay without output. Write
/// failures are returned so the caller can drop the connection.
pub async fn replay(
    handler: &ConnectionHandler,
    store: &SampleStore,
    encoder: &LineEncoder,
    baud: BaudRate,
    range: HistoryRange,
) -> Result<ReplayOutcome, ConnectionError> {
    let rows = match store.query_range(range.start, range.end).await {
        Ok(rows) => rows,
        Err(e @ StoreError::InvalidRange { .. }) => {
            warn!("Client {} history request rejected: {}", handler.peer(), e);
            return Ok(ReplayOutcome::InvalidRange);
        }
        Err(e) => {
            error!(
                "Client {} history {} failed: {}",
                handler.peer(),
                range,
                e
            );
            return Ok(ReplayOutcome::StorageFailed);
        }
    };

    let mut bytes = 0u64;
    for row in &rows {
        let line = encoder.history(row);
        handler.send_line(&line).await?;
        bytes += line.len() as u64;
        tokio::time::sleep(replay_delay(line.len(), baud)).await;
    }
    handler.send_line(END_OF_REPLAY).await?;
    bytes += END_OF_REPLAY.len() as u64;

    info!(
        "Client {} history {} replayed: {} rows, {}",
        handler.peer(),
        range,
        rows.len(),
        format_bytes(bytes)
    );

    Ok(ReplayOutcome::Completed {
        rows: rows.len(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::OutputFormat;
    use crate::store::MemoryLog;
    use crate::types::{ChannelName, Reading};
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;

    fn channels() -> Arc<[ChannelName]> {
        ["Temp", "SN1"]
            .iter()
            .map(|n| ChannelName::new(n.to_string()).unwrap())
            .collect()
    }

    async fn store_with(times: &[i64]) -> (SampleStore, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::new());
        let store = SampleStore::new(log.clone(), channels());
        for &t in times {
            let values = store
                .channels()
                .iter()
                .cloned()
                .zip([t as f64, 1.0])
                .collect();
            store.publish(Reading::new(t, values)).await.unwrap();
        }
        (store, log)
    }

    fn encoder() -> LineEncoder {
        LineEncoder::new(OutputFormat::Csv, channels())
    }

    #[test]
    fn test_replay_delay_formula() {
        let baud = BaudRate::new(9600).unwrap();
        let delay = replay_delay(12, baud);
        assert!((delay.as_secs_f64() - 1.1 * 8.0 * 12.0 / 9600.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_rows_then_marker() {
        let (store, _) = store_with(&[10, 20, 30]).await;
        let (mut client, server) = tokio::io::duplex(4096);
        let handler = ConnectionHandler::new("replay", Box::new(server));

        let outcome = replay(
            &handler,
            &store,
            &encoder(),
            BaudRate::DEFAULT,
            HistoryRange::new(15, 30),
        )
        .await
        .unwrap();

        let expected = b"h20,20,1\nh30,30,1\nh\n";
        assert_eq!(
            outcome,
            ReplayOutcome::Completed {
                rows: 2,
                bytes: expected.len() as u64
            }
        );

        let mut received = vec![0u8; expected.len()];
        client.read_exact(&mut received).await.unwrap();
        assert_eq!(received, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_empty_range_sends_marker_only() {
        let (store, _) = store_with(&[10]).await;
        let (mut client, server) = tokio::io::duplex(64);
        let handler = ConnectionHandler::new("replay", Box::new(server));

        let outcome = replay(
            &handler,
            &store,
            &encoder(),
            BaudRate::DEFAULT,
            HistoryRange::new(100, 200),
        )
        .await
        .unwrap();
        assert_eq!(outcome, ReplayOutcome::Completed { rows: 0, bytes: 2 });

        let mut received = [0u8; 2];
        client.read_exact(&mut received).await.unwrap();
        assert_eq!(&received, b"h\n");
    }

    #[tokio::test]
    async fn test_inverted_range_writes_nothing() {
        let (store, _) = store_with(&[10, 20]).await;
        let handler = ConnectionHandler::new("replay", Box::new(tokio::io::sink()));

        let outcome = replay(
            &handler,
            &store,
            &encoder(),
            BaudRate::DEFAULT,
            HistoryRange::new(30, 15),
        )
        .await
        .unwrap();
        assert_eq!(outcome, ReplayOutcome::InvalidRange);
        assert_eq!(handler.bytes_sent(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_writes_nothing() {
        let (store, log) = store_with(&[10, 20]).await;
        log.set_offline(true);
        let handler = ConnectionHandler::new("replay", Box::new(tokio::io::sink()));

        let outcome = replay(
            &handler,
            &store,
            &encoder(),
            BaudRate::DEFAULT,
            HistoryRange::new(0, 100),
        )
        .await
        .unwrap();
        assert_eq!(outcome, ReplayOutcome::StorageFailed);
        assert_eq!(handler.bytes_sent(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_is_paced_by_baud_rate() {
        let (store, _) = store_with(&[10, 20, 30]).await;
        let handler = ConnectionHandler::new("replay", Box::new(tokio::io::sink()));
        let baud = BaudRate::new(1200).unwrap();

        let started = tokio::time::Instant::now();
        replay(
            &handler,
            &store,
            &encoder(),
            baud,
            HistoryRange::new(0, 100),
        )
        .await
        .unwrap();
        let elapsed = started.elapsed();

        // Three 9-byte rows ("h10,10,1\n" etc.), each followed by its pause
        let expected = replay_delay(9, baud) * 3;
        assert!(elapsed >= expected, "{elapsed:?} < {expected:?}");
    }

    #[tokio::test]
    async fn test_closed_connection_is_an_error() {
        let (store, _) = store_with(&[10]).await;
        let handler = ConnectionHandler::new("replay", Box::new(tokio::io::sink()));
        handler.close().await;

        let result = replay(
            &handler,
            &store,
            &encoder(),
            BaudRate::DEFAULT,
            HistoryRange::new(0, 100),
        )
        .await;
        assert!(matches!(result, Err(ConnectionError::Closed { .. })));
    }
}
