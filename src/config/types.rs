//! Configuration type definitions
//!
//! This module contains the configuration structures read from `config.toml`.

use crate::protocol::OutputFormat;
use crate::types::{BaudRate, ChannelName, HostName, Port, ThreadCount, duration_serde};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where sensor values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorSource {
    /// Deterministic generated values, no hardware needed
    #[default]
    Simulated,
    /// GPIO-multiplexed IIO ADC
    MuxAdc,
}

impl std::fmt::Display for SensorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simulated => f.write_str("simulated"),
            Self::MuxAdc => f.write_str("mux_adc"),
        }
    }
}

/// Durable log implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    /// Volatile; history is lost on restart
    Memory,
}

/// Main server configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Client listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host/IP to bind to (default: 0.0.0.0)
    pub host: HostName,
    /// Port to listen on (default: 7070)
    pub port: Port,
    /// Number of worker threads (default: 1)
    pub threads: ThreadCount,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: super::defaults::listen_host(),
            port: Port::default(),
            threads: ThreadCount::default(),
        }
    }
}

/// Sensor sampling settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplerConfig {
    /// Time between samples
    #[serde(with = "duration_serde", default = "super::defaults::sample_period")]
    pub period: Duration,
    #[serde(default)]
    pub source: SensorSource,
    /// Channel names, in column order
    #[serde(default = "super::defaults::channels")]
    pub channels: Vec<ChannelName>,
    #[serde(default)]
    pub mux_adc: MuxAdcConfig,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            period: super::defaults::sample_period(),
            source: SensorSource::default(),
            channels: super::defaults::channels(),
            mux_adc: MuxAdcConfig::default(),
        }
    }
}

/// sysfs layout of the multiplexed ADC
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MuxAdcConfig {
    /// sysfs GPIO root (contains `export` and `gpioN/`)
    pub gpio_base: PathBuf,
    /// Mux select lines, most significant bit first
    pub mux_pins: Vec<u32>,
    /// IIO raw sample file
    pub adc_raw: PathBuf,
    /// IIO scale file
    pub adc_scale: PathBuf,
}

impl Default for MuxAdcConfig {
    fn default() -> Self {
        use crate::constants::hardware;
        Self {
            gpio_base: PathBuf::from(hardware::GPIO_BASE),
            mux_pins: hardware::MUX_PINS.to_vec(),
            adc_raw: PathBuf::from(hardware::ADC_RAW),
            adc_scale: PathBuf::from(hardware::ADC_SCALE),
        }
    }
}

/// Broadcast loop settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BroadcastConfig {
    /// Time between broadcast ticks
    #[serde(with = "duration_serde", default = "super::defaults::broadcast_period")]
    pub period: Duration,
    /// Real-time payload format
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            period: super::defaults::broadcast_period(),
            format: OutputFormat::default(),
        }
    }
}

/// Client link settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkConfig {
    /// Nominal link throughput used to pace history replay
    pub baud_rate: BaudRate,
    /// Seconds a line write may stall before the client is dropped
    #[serde(with = "duration_serde")]
    pub write_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: BaudRate::default(),
            write_timeout: super::defaults::write_timeout(),
        }
    }
}

/// Durable storage settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// SQLite database file
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: super::defaults::database_path(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Optional log file, written in addition to stdout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}
