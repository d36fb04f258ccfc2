//! Constants used throughout the sensor server
//!
//! This module centralizes protocol limits and timing values.

use std::time::Duration;

/// Line protocol limits
pub mod protocol {
    /// Bytes requested from the transport per read
    pub const READ_CHUNK: usize = 1024;

    /// Longest command line accepted before the buffer is discarded
    pub const MAX_LINE: usize = 512;

    /// Tag byte for real-time lines
    pub const REAL_TIME_TAG: u8 = b'r';

    /// Tag byte for history lines and the end-of-replay marker
    pub const HISTORY_TAG: u8 = b'h';
}

/// History replay pacing
pub mod replay {
    /// Headroom over the nominal link rate
    pub const SAFETY_MARGIN: f64 = 1.1;

    pub const BITS_PER_BYTE: f64 = 8.0;
}

/// Loop timing
pub mod timing {
    use super::Duration;

    /// Default sampling period
    pub const SAMPLE_PERIOD: Duration = Duration::from_secs(3);

    /// Default broadcast period
    pub const BROADCAST_PERIOD: Duration = Duration::from_secs(3);

    /// Shortest period either loop accepts
    pub const MIN_PERIOD: Duration = Duration::from_secs(1);

    /// Longest a single line write may take before the client is dropped
    pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Sensor hardware
pub mod hardware {
    /// Value reported for a channel whose read failed
    pub const FAILED_READ: f64 = -1.0;

    /// GPIO lines driving the analog multiplexer select inputs, MSB first
    pub const MUX_PINS: [u32; 4] = [24, 25, 26, 27];

    /// Default sysfs GPIO root
    pub const GPIO_BASE: &str = "/sys/class/gpio";

    /// Default IIO raw sample file
    pub const ADC_RAW: &str = "/sys/bus/iio/devices/iio:device0/in_voltage0_raw";

    /// Default IIO scale file
    pub const ADC_SCALE: &str = "/sys/bus/iio/devices/iio:device0/in_voltage_scale";
}

/// Default channel set of the sensor array
pub const DEFAULT_CHANNELS: [&str; 6] = ["Temp", "SN1", "SN2", "SN3", "SN4", "PM25"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_limit_fits_in_chunk() {
        assert!(protocol::MAX_LINE <= protocol::READ_CHUNK);
    }

    #[test]
    fn test_default_periods_respect_minimum() {
        assert!(timing::SAMPLE_PERIOD >= timing::MIN_PERIOD);
        assert!(timing::BROADCAST_PERIOD >= timing::MIN_PERIOD);
    }

    #[test]
    fn test_default_channels_fit_mux() {
        let inputs = 1usize << hardware::MUX_PINS.len();
        assert!(DEFAULT_CHANNELS.len() * 2 <= inputs);
    }
}
