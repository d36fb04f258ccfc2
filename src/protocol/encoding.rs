//! Outbound line encoding
//!
//! Every outbound line is a tag byte, a payload and `\n`:
//!
//! | Tag | Payload |
//! |-----|---------|
//! | `r` | CSV `time,v1,...` or a JSON object, one real-time reading |
//! | `h` | CSV `time,v1,...`, one logged row |
//! | `h` | empty, end of replay |

use std::fmt::Write as _;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::constants::protocol::{HISTORY_TAG, REAL_TIME_TAG};
use crate::types::{ChannelName, Reading};

/// End-of-replay marker
pub const END_OF_REPLAY: &[u8] = b"h\n";

/// Payload format for real-time lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[derive(clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{}' (expected csv or json)", other)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Encodes readings into framed protocol lines
///
/// Columns follow the configured channel order. A channel missing from a
/// reading is written as an empty CSV field (history rows may hold a subset
/// of channels) and omitted from JSON objects.
#[derive(Debug, Clone)]
pub struct LineEncoder {
    format: OutputFormat,
    channels: Arc<[ChannelName]>,
}

impl LineEncoder {
    #[must_use]
    pub fn new(format: OutputFormat, channels: Arc<[ChannelName]>) -> Self {
        Self { format, channels }
    }

    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    #[must_use]
    pub fn channels(&self) -> &[ChannelName] {
        &self.channels
    }

    /// `r` line for one real-time reading
    #[must_use]
    pub fn real_time(&self, reading: &Reading) -> Vec<u8> {
        match self.format {
            OutputFormat::Csv => self.csv_line(REAL_TIME_TAG, reading),
            OutputFormat::Json => self.json_line(reading),
        }
    }

    /// `h` line for one logged row; always CSV
    #[must_use]
    pub fn history(&self, reading: &Reading) -> Vec<u8> {
        self.csv_line(HISTORY_TAG, reading)
    }

    fn csv_line(&self, tag: u8, reading: &Reading) -> Vec<u8> {
        let mut line = String::with_capacity(16 + self.channels.len() * 12);
        line.push(tag as char);
        // Writing to a String cannot fail
        let _ = write!(line, "{}", reading.timestamp());
        for channel in self.channels.iter() {
            line.push(',');
            if let Some(value) = reading.get(channel) {
                let _ = write!(line, "{}", value);
            }
        }
        line.push('\n');
        line.into_bytes()
    }

    fn json_line(&self, reading: &Reading) -> Vec<u8> {
        let row = JsonRow {
            reading,
            channels: &self.channels,
        };
        let mut line = vec![REAL_TIME_TAG];
        // JsonRow only emits integers, floats and identifier keys
        if serde_json::to_writer(&mut line, &row).is_err() {
            line.truncate(1);
            line.extend_from_slice(b"{}");
        }
        line.push(b'\n');
        line
    }
}

/// Serializes a reading as `{"time":T,"<channel>":v,...}` in channel order
struct JsonRow<'a> {
    reading: &'a Reading,
    channels: &'a [ChannelName],
}

impl Serialize for JsonRow<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("time", &self.reading.timestamp())?;
        for channel in self.channels {
            if let Some(value) = self.reading.get(channel) {
                map.serialize_entry(channel.as_str(), &value)?;
            }
        }
        map.end()
    }
}
