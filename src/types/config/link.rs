//! Wireless link throughput configuration

use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::replay::{BITS_PER_BYTE, SAFETY_MARGIN};

nonzero_newtype! {
    /// Nominal throughput of the client link in bits per second
    ///
    /// History replay is paced against this value so a large backlog does not
    /// overrun the radio's buffering.
    ///
    /// # Examples
    /// ```
    /// use airsense::types::BaudRate;
    ///
    /// let baud = BaudRate::new(9600).unwrap();
    /// assert_eq!(baud.get(), 9600);
    ///
    /// assert!(BaudRate::new(0).is_none());
    /// ```
    #[doc(alias = "bitrate")]
    pub struct BaudRate(NonZeroU32: u32, serialize as serialize_u32);
}

impl BaudRate {
    /// Default link rate (classic Bluetooth SPP profile setting)
    pub const DEFAULT: Self = Self(NonZeroU32::new(115_200).unwrap());

    /// Time the link needs for `bytes` bytes, with the replay safety margin applied
    ///
    /// `1.1 * 8 * bytes / baud` seconds.
    ///
    /// # Examples
    /// ```
    /// use airsense::types::BaudRate;
    /// use std::time::Duration;
    ///
    /// let baud = BaudRate::new(8800).unwrap();
    /// assert_eq!(baud.pacing_delay(1000), Duration::from_secs(1));
    /// ```
    #[must_use]
    pub fn pacing_delay(&self, bytes: usize) -> Duration {
        let seconds = SAFETY_MARGIN * BITS_PER_BYTE * bytes as f64 / f64::from(self.get());
        Duration::from_secs_f64(seconds)
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for BaudRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .parse::<u32>()
            .map_err(|e| format!("invalid baud rate '{}': {}", s, e))?;
        Self::new(value).ok_or_else(|| "baud rate cannot be 0".to_string())
    }
}
