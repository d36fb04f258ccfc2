//! One client connection
//!
//! A [`ConnectionHandler`] owns the write half of a client stream and the
//! connection's [`ModeState`]. The read half is driven by
//! [`ConnectionHandler::read_commands`] on the connection's own task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use crate::connection_error::ConnectionError;
use crate::constants::protocol::READ_CHUNK;
use crate::constants::timing::WRITE_TIMEOUT;
use crate::protocol::{LineFramer, ProtocolError, parse_command};
use crate::types::ClientId;

use super::ModeState;

/// Boxed write half of a client transport
pub type ClientWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// State and write side of a single client connection
pub struct ConnectionHandler {
    id: ClientId,
    peer: String,
    mode: ModeState,
    /// `None` once the connection is closed
    writer: Mutex<Option<ClientWriter>>,
    closed: watch::Sender<bool>,
    bytes_sent: AtomicU64,
    write_timeout: Duration,
}

impl std::fmt::Debug for ConnectionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandler")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("mode", &self.mode.mode())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ConnectionHandler {
    pub fn new(peer: impl Into<String>, writer: ClientWriter) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            id: ClientId::new(),
            peer: peer.into(),
            mode: ModeState::new(),
            writer: Mutex::new(Some(writer)),
            closed,
            bytes_sent: AtomicU64::new(0),
            write_timeout: WRITE_TIMEOUT,
        }
    }

    /// Bound on each line write (and the final shutdown)
    #[must_use]
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ClientId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> &ModeState {
        &self.mode
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Total bytes written to this client
    #[must_use]
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Write one framed line
    ///
    /// The writer lock is held for the whole line, so lines from the real-time
    /// path and a replay never interleave. A write that fails, or that does
    /// not complete within the write timeout, closes the writer; every later
    /// send returns [`ConnectionError::Closed`].
    pub async fn send_line(&self, line: &[u8]) -> Result<(), ConnectionError> {
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Err(ConnectionError::Closed {
                peer: self.peer.clone(),
            });
        };

        let write = async {
            writer.write_all(line).await?;
            writer.flush().await
        };
        let result = match tokio::time::timeout(self.write_timeout, write).await {
            Ok(result) => result,
            Err(_) => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("write stalled for {:?}", self.write_timeout),
            )),
        };

        match result {
            Ok(()) => {
                self.bytes_sent
                    .fetch_add(line.len() as u64, Ordering::Relaxed);
                Ok(())
            }
            Err(source) => {
                // Dropping the writer releases the transport; no shutdown on a broken stream
                guard.take();
                self.closed.send_replace(true);
                Err(ConnectionError::Write {
                    peer: self.peer.clone(),
                    source,
                })
            }
        }
    }

    /// Shut down the write half and stop the reader task
    ///
    /// Idempotent.
    pub async fn close(&self) {
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            match tokio::time::timeout(self.write_timeout, writer.shutdown()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!("Client {} shutdown error: {}", self.peer, e),
                Err(_) => debug!("Client {} shutdown timed out", self.peer),
            }
        }
        self.closed.send_replace(true);
    }

    /// Read and apply client commands until EOF, a read error or [`close`](Self::close)
    ///
    /// Protocol errors are logged and the offending line dropped; they never
    /// end the connection.
    pub async fn read_commands<R>(&self, mut reader: R) -> Result<(), ConnectionError>
    where
        R: AsyncRead + Unpin,
    {
        let mut closed = self.closed.subscribe();
        let mut framer = LineFramer::default();
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = tokio::select! {
                _ = closed.wait_for(|closed| *closed) => return Ok(()),
                read = reader.read(&mut chunk) => read.map_err(|source| ConnectionError::Read {
                    peer: self.peer.clone(),
                    source,
                })?,
            };

            if n == 0 {
                debug!("Client {} sent EOF", self.peer);
                return Ok(());
            }

            framer.extend(&chunk[..n]);
            while let Some(line) = framer.next_line() {
                match line.and_then(|line| parse_command(&line)) {
                    Ok(command) => {
                        let mode = self.mode.apply(command);
                        debug!(client = %self.peer, ?command, ?mode, "Command applied");
                    }
                    Err(e) => self.log_protocol_error(&e),
                }
            }
        }
    }

    fn log_protocol_error(&self, error: &ProtocolError) {
        if error.log_level() == tracing::Level::DEBUG {
            debug!("Client {} ignored line: {}", self.peer, error);
        } else {
            warn!("Client {} protocol error: {}", self.peer, error);
        }
    }
}
