//! Sensor line protocol
//!
//! Clients send newline-terminated commands and receive tagged lines. This
//! module is transport-agnostic: it frames bytes into lines, parses commands
//! and encodes readings, while the session layer owns the streams.

mod commands;
mod encoding;
mod framing;

pub use commands::{ClientCommand, HistoryRange, ProtocolError, parse_command};
pub use encoding::{END_OF_REPLAY, LineEncoder, OutputFormat};
pub use framing::LineFramer;
