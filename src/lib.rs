//! # airsense
//!
//! Streams air-quality sensor readings to wireless clients.
//!
//! A [`Sampler`] reads the sensor array once per period and publishes each
//! [`Reading`] to the [`SampleStore`], which keeps the latest reading in
//! memory and appends every reading to a per-channel durable log. Clients
//! connect over a byte stream and send line commands:
//!
//! - `start` / `stop` toggle real-time streaming (`r` lines)
//! - `history <start> <end>` replays logged rows (`h` lines) paced for the
//!   radio link, followed by an empty `h` line
//!
//! The [`BroadcastLoop`] serves every connection once per period.

pub mod args;
pub mod broadcast;
pub mod config;
pub mod connection_error;
pub mod constants;
pub mod formatting;
pub mod logging;
pub mod protocol;
pub mod runtime;
pub mod sampler;
pub mod server;
pub mod session;
pub mod store;
pub mod types;

#[cfg(test)]
mod test_macros;

pub use broadcast::{BroadcastLoop, ReplayOutcome, TickSummary};
pub use config::{Config, create_default_config, load_config};
pub use connection_error::ConnectionError;
pub use protocol::{ClientCommand, HistoryRange, LineEncoder, OutputFormat, ProtocolError};
pub use sampler::{ChannelReader, HardwareError, MuxAdcReader, Sampler, SimulatedReader};
pub use server::SensorServer;
pub use session::{ConnectionHandler, ConnectionRegistry, StreamMode, serve_connection};
pub use store::{MemoryLog, SampleLog, SampleStore, SqliteLog, StoreError};
pub use types::{ChannelName, ClientId, Reading, Timestamp};
