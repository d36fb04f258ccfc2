//! Default values for configuration fields
//!
//! This module centralizes all default value functions used in serde deserialization.

use crate::constants::{DEFAULT_CHANNELS, timing};
use crate::types::{ChannelName, HostName};
use std::path::PathBuf;
use std::time::Duration;

/// Default listen host (all interfaces)
pub const LISTEN_HOST: &str = "0.0.0.0";

/// Default SQLite database file
pub const DATABASE_PATH: &str = "air_pollution_data.db";

#[inline]
pub fn listen_host() -> HostName {
    HostName::new(LISTEN_HOST.to_string()).expect("default host is non-empty")
}

#[inline]
pub fn sample_period() -> Duration {
    timing::SAMPLE_PERIOD
}

#[inline]
pub fn broadcast_period() -> Duration {
    timing::BROADCAST_PERIOD
}

#[inline]
pub fn write_timeout() -> Duration {
    timing::WRITE_TIMEOUT
}

/// Default sensor array channels
pub fn channels() -> Vec<ChannelName> {
    DEFAULT_CHANNELS
        .iter()
        .map(|name| ChannelName::new(name.to_string()).expect("default channel names are valid"))
        .collect()
}

#[inline]
pub fn database_path() -> PathBuf {
    PathBuf::from(DATABASE_PATH)
}
