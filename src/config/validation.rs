//! Configuration validation
//!
//! Non-zero ports, baud rates and thread counts and well-formed channel names
//! are enforced by their types at parse time. This module checks the
//! constraints that span fields.

use anyhow::Result;
use std::collections::HashSet;
use std::time::Duration;

use super::types::{Config, SamplerConfig, SensorSource};
use crate::constants::timing::MIN_PERIOD;

impl Config {
    /// Validate configuration for correctness
    ///
    /// - At least one channel, with no duplicate names
    /// - Sampling and broadcast periods of at least one second
    /// - A non-zero client write timeout
    /// - Channel count within the multiplexer capacity when sampling hardware
    pub fn validate(&self) -> Result<()> {
        validate_sampler(&self.sampler)?;
        validate_period("broadcast", self.broadcast.period)?;
        if self.link.write_timeout.is_zero() {
            return Err(anyhow::anyhow!("[link] write_timeout must be at least 1 second"));
        }
        Ok(())
    }
}

fn validate_period(section: &str, period: Duration) -> Result<()> {
    if period < MIN_PERIOD {
        return Err(anyhow::anyhow!(
            "[{}] period must be at least {:?}, got {:?}",
            section,
            MIN_PERIOD,
            period
        ));
    }
    Ok(())
}

fn validate_sampler(sampler: &SamplerConfig) -> Result<()> {
    validate_period("sampler", sampler.period)?;

    if sampler.channels.is_empty() {
        return Err(anyhow::anyhow!(
            "Configuration must have at least one channel"
        ));
    }

    let mut seen = HashSet::new();
    for channel in &sampler.channels {
        if !seen.insert(channel.as_str()) {
            return Err(anyhow::anyhow!("Duplicate channel name '{}'", channel));
        }
    }

    if sampler.source == SensorSource::MuxAdc {
        let pins = sampler.mux_adc.mux_pins.len();
        if pins == 0 {
            return Err(anyhow::anyhow!("[sampler.mux_adc] mux_pins cannot be empty"));
        }
        // Each channel is a differential pair of mux inputs
        let capacity = 1usize.checked_shl(pins as u32).unwrap_or(usize::MAX) / 2;
        if sampler.channels.len() > capacity {
            return Err(anyhow::anyhow!(
                "{} channels configured but {} mux pins address only {}",
                sampler.channels.len(),
                pins,
                capacity
            ));
        }
    }

    Ok(())
}
