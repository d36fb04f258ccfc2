//! Timestamped sensor readings

use std::time::{SystemTime, UNIX_EPOCH};

use super::ChannelName;

/// Unix time in whole seconds
pub type Timestamp = i64;

/// Current unix time in seconds
///
/// Clocks set before 1970 report 0 rather than failing the sampler.
#[must_use]
pub fn unix_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as Timestamp)
        .unwrap_or(0)
}

/// One timestamped vector of channel values
///
/// Values keep the order they were built in, which is the configured channel
/// order. Readings are never mutated after construction and are shared as
/// `Arc<Reading>` between the sampler, the store and every connection.
///
/// History rows use the same type; a history row may hold only the subset of
/// channels that were logged at that timestamp.
///
/// # Examples
/// ```
/// use airsense::types::{ChannelName, Reading};
///
/// let temp = ChannelName::new("Temp".to_string()).unwrap();
/// let reading = Reading::new(100, vec![(temp, 21.5)]);
///
/// assert_eq!(reading.timestamp(), 100);
/// assert_eq!(reading.get("Temp"), Some(21.5));
/// assert_eq!(reading.get("PM25"), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    timestamp: Timestamp,
    values: Vec<(ChannelName, f64)>,
}

impl Reading {
    #[must_use]
    pub fn new(timestamp: Timestamp, values: Vec<(ChannelName, f64)>) -> Self {
        Self { timestamp, values }
    }

    #[must_use]
    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    #[must_use]
    #[inline]
    pub fn values(&self) -> &[(ChannelName, f64)] {
        &self.values
    }

    /// Value of the named channel, if present
    #[must_use]
    pub fn get(&self, channel: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name.as_str() == channel)
            .map(|(_, value)| *value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
