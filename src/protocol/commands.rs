//! Client command parsing
//!
//! Commands are whole lines, matched exactly and case-sensitively:
//!
//! - `start` - stream real-time readings
//! - `stop` - stop streaming
//! - `history <start> <end>` - replay logged rows with `start <= time <= end`

use thiserror::Error;

use crate::formatting::printable_line;
use crate::types::Timestamp;

/// Inclusive timestamp range of a history request
///
/// The range is stored as the client sent it. An inverted range (`start > end`)
/// is a valid command; the store rejects it when the replay runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl HistoryRange {
    #[must_use]
    pub const fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Whether `start <= end`
    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

impl std::fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// A recognized client command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    Start,
    Stop,
    History(HistoryRange),
}

/// Malformed or unrecognized inbound data
///
/// None of these close the connection; the offending line is dropped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("line exceeds {limit} bytes without a terminator")]
    LineTooLong { limit: usize },

    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    #[error("malformed history command: {0:?}")]
    MalformedHistory(String),

    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
}

impl ProtocolError {
    /// Unknown commands are routine (terminal noise, probes); the rest are warnings
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self {
            Self::UnknownCommand(_) => tracing::Level::DEBUG,
            _ => tracing::Level::WARN,
        }
    }
}

const HISTORY_KEYWORD: &str = "history";

/// Parse one command line
///
/// `line` excludes the `\n` terminator and any trailing `\r`.
///
/// # Examples
/// ```
/// use airsense::protocol::{ClientCommand, HistoryRange, ProtocolError, parse_command};
///
/// assert_eq!(parse_command(b"start"), Ok(ClientCommand::Start));
/// assert_eq!(
///     parse_command(b"history 15 30"),
///     Ok(ClientCommand::History(HistoryRange::new(15, 30)))
/// );
/// assert!(matches!(parse_command(b"START"), Err(ProtocolError::UnknownCommand(_))));
/// ```
pub fn parse_command(line: &[u8]) -> Result<ClientCommand, ProtocolError> {
    let text = std::str::from_utf8(line).map_err(|_| ProtocolError::InvalidUtf8)?;

    match text {
        "start" => return Ok(ClientCommand::Start),
        "stop" => return Ok(ClientCommand::Stop),
        _ => {}
    }

    match text.strip_prefix(HISTORY_KEYWORD) {
        Some("") => Err(ProtocolError::MalformedHistory(text.to_string())),
        Some(rest) if rest.starts_with(' ') => parse_history_args(&rest[1..])
            .map(ClientCommand::History)
            .ok_or_else(|| ProtocolError::MalformedHistory(text.to_string())),
        _ => Err(ProtocolError::UnknownCommand(printable_line(line))),
    }
}

fn parse_history_args(args: &str) -> Option<HistoryRange> {
    let (start, end) = args.split_once(' ')?;
    Some(HistoryRange::new(parse_timestamp(start)?, parse_timestamp(end)?))
}

/// Non-negative decimal digits only; no sign, no padding, must fit in i64
fn parse_timestamp(field: &str) -> Option<Timestamp> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<Timestamp>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop() {
        assert_eq!(parse_command(b"start"), Ok(ClientCommand::Start));
        assert_eq!(parse_command(b"stop"), Ok(ClientCommand::Stop));
    }

    #[test]
    fn test_commands_are_case_sensitive() {
        for line in [&b"Start"[..], b"STOP", b"History 1 2"] {
            assert!(matches!(
                parse_command(line),
                Err(ProtocolError::UnknownCommand(_))
            ));
        }
    }

    #[test]
    fn test_commands_require_exact_match() {
        for line in [&b" start"[..], b"start ", b"stopp", b"st art", b""] {
            assert!(matches!(
                parse_command(line),
                Err(ProtocolError::UnknownCommand(_))
            ));
        }
    }

    #[test]
    fn test_history_valid() {
        assert_eq!(
            parse_command(b"history 0 9223372036854775807"),
            Ok(ClientCommand::History(HistoryRange::new(0, i64::MAX)))
        );
    }

    #[test]
    fn test_history_inverted_range_parses() {
        let cmd = parse_command(b"history 30 15").unwrap();
        match cmd {
            ClientCommand::History(range) => {
                assert_eq!(range, HistoryRange::new(30, 15));
                assert!(!range.is_ordered());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_history_malformed() {
        let cases: &[&[u8]] = &[
            b"history",
            b"history ",
            b"history 1",
            b"history 1 ",
            b"history  1 2",
            b"history 1  2",
            b"history 1 2 3",
            b"history -1 2",
            b"history +1 2",
            b"history a b",
            b"history 1 9223372036854775808",
            b"history 0x10 20",
        ];
        for line in cases {
            assert!(
                matches!(parse_command(line), Err(ProtocolError::MalformedHistory(_))),
                "{:?}",
                String::from_utf8_lossy(line)
            );
        }
    }

    #[test]
    fn test_history_prefix_without_space_is_unknown() {
        assert!(matches!(
            parse_command(b"history2 3"),
            Err(ProtocolError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(
            parse_command(&[0xff, 0xfe, b's']),
            Err(ProtocolError::InvalidUtf8)
        );
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(
            ProtocolError::UnknownCommand("x".into()).log_level(),
            tracing::Level::DEBUG
        );
        assert_eq!(ProtocolError::InvalidUtf8.log_level(), tracing::Level::WARN);
        assert_eq!(
            ProtocolError::LineTooLong { limit: 512 }.log_level(),
            tracing::Level::WARN
        );
    }

    #[test]
    fn test_range_display() {
        assert_eq!(HistoryRange::new(10, 20).to_string(), "10..=20");
    }
}
