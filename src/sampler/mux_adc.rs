//! Analog multiplexer + IIO ADC sensor reader
//!
//! The sensor board routes 16 analog inputs through a multiplexer whose
//! select lines are sysfs GPIOs. Each sensor is wired differentially across
//! two adjacent inputs: sensor `n` uses inputs `2n` and `2n + 1`, and its value
//! is `v(2n) - v(2n + 1)`. An input's voltage is `raw * scale` from the IIO
//! ADC's sysfs files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::MuxAdcConfig;

use super::{ChannelReader, HardwareError};

/// Reader for the GPIO-multiplexed ADC
///
/// Select lines are configured as outputs on open and driven low on drop.
#[derive(Debug)]
pub struct MuxAdcReader {
    gpio_base: PathBuf,
    pins: Vec<u32>,
    adc_raw: PathBuf,
    adc_scale: PathBuf,
    /// Held from mux select until the ADC read completes
    bus: Mutex<()>,
}

impl MuxAdcReader {
    /// Export the select pins if needed and make them outputs
    pub fn open(config: &MuxAdcConfig) -> Result<Self, HardwareError> {
        let reader = Self {
            gpio_base: config.gpio_base.clone(),
            pins: config.mux_pins.clone(),
            adc_raw: config.adc_raw.clone(),
            adc_scale: config.adc_scale.clone(),
            bus: Mutex::new(()),
        };

        for &pin in &reader.pins {
            let pin_dir = reader.pin_dir(pin);
            if !pin_dir.exists() {
                let export = reader.gpio_base.join("export");
                std::fs::write(&export, pin.to_string())
                    .map_err(|e| HardwareError::io(&export, e))?;
            }
            let direction = pin_dir.join("direction");
            std::fs::write(&direction, "out").map_err(|e| HardwareError::io(&direction, e))?;
        }

        debug!("Mux select pins {:?} set to output", reader.pins);
        Ok(reader)
    }

    /// Number of mux inputs addressable with the configured select pins
    #[must_use]
    pub fn capacity(&self) -> usize {
        1usize << self.pins.len()
    }

    /// Number of differential channels the mux can serve
    #[must_use]
    pub fn channel_capacity(&self) -> usize {
        self.capacity() / 2
    }

    fn pin_dir(&self, pin: u32) -> PathBuf {
        self.gpio_base.join(format!("gpio{}", pin))
    }

    /// Per-pin levels for a mux input, first pin carries the most significant bit
    fn select_levels(&self, input: usize) -> impl Iterator<Item = (u32, bool)> + '_ {
        let width = self.pins.len();
        self.pins
            .iter()
            .enumerate()
            .map(move |(i, &pin)| (pin, (input >> (width - 1 - i)) & 1 == 1))
    }

    async fn select(&self, input: usize) -> Result<(), HardwareError> {
        for (pin, high) in self.select_levels(input) {
            let value = self.pin_dir(pin).join("value");
            tokio::fs::write(&value, if high { "1" } else { "0" })
                .await
                .map_err(|e| HardwareError::io(&value, e))?;
        }
        Ok(())
    }

    async fn read_input(&self, input: usize) -> Result<f64, HardwareError> {
        self.select(input).await?;
        let raw = read_number(&self.adc_raw).await?;
        let scale = read_number(&self.adc_scale).await?;
        Ok(raw * scale)
    }
}

async fn read_number(path: &Path) -> Result<f64, HardwareError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| HardwareError::io(path, e))?;
    text.trim().parse::<f64>().map_err(|_| HardwareError::Parse {
        path: path.to_path_buf(),
        value: text.trim().to_string(),
    })
}

#[async_trait]
impl ChannelReader for MuxAdcReader {
    async fn read_channel(&self, index: usize) -> Result<f64, HardwareError> {
        if index >= self.channel_capacity() {
            return Err(HardwareError::MuxCapacity {
                index,
                capacity: self.capacity(),
            });
        }

        let _bus = self.bus.lock().await;
        let positive = self.read_input(2 * index).await?;
        let negative = self.read_input(2 * index + 1).await?;
        Ok(positive - negative)
    }

    fn describe(&self) -> String {
        format!(
            "mux ADC ({} select pins, {})",
            self.pins.len(),
            self.adc_raw.display()
        )
    }
}

impl Drop for MuxAdcReader {
    fn drop(&mut self) {
        for &pin in &self.pins {
            let value = self.pin_dir(pin).join("value");
            if let Err(e) = std::fs::write(&value, "0") {
                warn!("Failed to release mux pin {}: {}", pin, e);
            }
        }
        debug!("Mux select pins released");
    }
}
