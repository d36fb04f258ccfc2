//! Configuration loading from files and environment variables
//!
//! Environment variables take precedence over the file, for container
//! deployments where the file is baked into the image.

use anyhow::{Context, Result};
use std::path::PathBuf;

use super::types::Config;

/// Overrides `[listener] port`
pub const ENV_PORT: &str = "AIRSENSE_PORT";
/// Overrides `[listener] host`
pub const ENV_HOST: &str = "AIRSENSE_HOST";
/// Overrides `[storage] path`
pub const ENV_DATABASE: &str = "AIRSENSE_DATABASE";
/// Overrides `[link] baud_rate`
pub const ENV_BAUD_RATE: &str = "AIRSENSE_BAUD_RATE";
/// Overrides `[broadcast] format`
pub const ENV_OUTPUT_FORMAT: &str = "AIRSENSE_OUTPUT_FORMAT";

/// Apply environment overrides using `lookup` to read variables
///
/// Returns the names of the variables that were applied, in a fixed order, so
/// the caller can log them once logging is up. Unset variables leave the file
/// value alone; set but unparsable ones are an error rather than being
/// silently ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<Vec<&'static str>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = Vec::new();

    if let Some(port) = lookup(ENV_PORT) {
        config.listener.port = port
            .parse()
            .with_context(|| format!("{ENV_PORT}='{port}'"))?;
        applied.push(ENV_PORT);
    }

    if let Some(host) = lookup(ENV_HOST) {
        config.listener.host = host
            .parse()
            .with_context(|| format!("{ENV_HOST}='{host}'"))?;
        applied.push(ENV_HOST);
    }

    if let Some(path) = lookup(ENV_DATABASE) {
        config.storage.path = PathBuf::from(path);
        applied.push(ENV_DATABASE);
    }

    if let Some(baud) = lookup(ENV_BAUD_RATE) {
        config.link.baud_rate = baud
            .parse()
            .map_err(|e: String| anyhow::anyhow!("{ENV_BAUD_RATE}='{baud}': {e}"))?;
        applied.push(ENV_BAUD_RATE);
    }

    if let Some(format) = lookup(ENV_OUTPUT_FORMAT) {
        config.broadcast.format = format
            .parse()
            .map_err(|e: String| anyhow::anyhow!("{ENV_OUTPUT_FORMAT}='{format}': {e}"))?;
        applied.push(ENV_OUTPUT_FORMAT);
    }

    Ok(applied)
}

/// Parse configuration text without touching the environment
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}

/// Load configuration from a TOML file, with environment variable overrides
///
/// The result is validated before it is returned, along with the names of the
/// environment variables that overrode file values.
pub fn load_config(config_path: &str) -> Result<(Config, Vec<&'static str>)> {
    let config_content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file '{}'", config_path))?;

    let mut config = parse_config(&config_content)
        .with_context(|| format!("Failed to parse config file '{}'", config_path))?;

    let overridden = apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    config.validate()?;

    Ok((config, overridden))
}

/// Create a default configuration, as written to a fresh `config.toml`
#[must_use]
pub fn create_default_config() -> Config {
    Config::default()
}
