//! Configuration module
//!
//! This module handles all configuration types and loading
//! for the sensor server.

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{
    ENV_BAUD_RATE, ENV_DATABASE, ENV_HOST, ENV_OUTPUT_FORMAT, ENV_PORT, apply_env_overrides,
    create_default_config, load_config, parse_config,
};
pub use types::{
    BroadcastConfig, Config, LinkConfig, ListenerConfig, LoggingConfig, MuxAdcConfig,
    SamplerConfig, SensorSource, StorageBackend, StorageConfig,
};

pub use defaults::{DATABASE_PATH, LISTEN_HOST};
