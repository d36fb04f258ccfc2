//! Client sessions
//!
//! Each accepted transport stream becomes a [`ConnectionHandler`] registered
//! in the shared [`ConnectionRegistry`]. The connection's task reads commands
//! until the client leaves; the broadcast loop writes to it through the
//! registry.

mod handler;
mod mode_state;
mod registry;

pub use handler::{ClientWriter, ConnectionHandler};
pub use mode_state::{ModeState, StreamMode};
pub use registry::ConnectionRegistry;

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::formatting::{format_bytes, short_id};

/// Serve one client stream until it disconnects
///
/// Registers the connection, runs its command reader, then removes and
/// closes it. If the broadcast loop removed the connection first (write
/// failure), only the log line remains to be written here.
pub async fn serve_connection<S>(stream: S, peer: String, registry: Arc<ConnectionRegistry>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let handler = Arc::new(
        ConnectionHandler::new(peer, Box::new(writer))
            .with_write_timeout(registry.write_timeout()),
    );
    let id = registry.register(handler.clone());

    info!(
        "Client {} connected [{}] ({} live)",
        handler.peer(),
        short_id(id.as_uuid()),
        registry.len()
    );

    let outcome = handler.read_commands(reader).await;

    if registry.remove(&id).is_some() {
        handler.close().await;
    }

    match outcome {
        Ok(()) => info!(
            "Client {} disconnected [{}], sent {}",
            handler.peer(),
            short_id(id.as_uuid()),
            format_bytes(handler.bytes_sent())
        ),
        Err(e) if e.log_level() == tracing::Level::DEBUG => {
            debug!("Client [{}] dropped: {}", short_id(id.as_uuid()), e);
        }
        Err(e) => warn!("Client [{}] dropped: {}", short_id(id.as_uuid()), e),
    }
}
