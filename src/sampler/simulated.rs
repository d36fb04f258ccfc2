//! Simulated sensor reader for running without hardware

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChannelReader, HardwareError};

/// Deterministic, slowly varying channel values
///
/// Channel `i` reads `base(i) + amplitude(i) * sin(0.1 * n + i)` on its
/// `n`-th read, where the first channel looks like a room temperature and
/// the rest like electrochemical sensor voltages.
#[derive(Debug, Default)]
pub struct SimulatedReader {
    reads: Mutex<HashMap<usize, u64>>,
    failing: HashSet<usize>,
}

impl SimulatedReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make reads of `index` fail, as a disconnected sensor would
    #[must_use]
    pub fn with_failing_channel(mut self, index: usize) -> Self {
        self.failing.insert(index);
        self
    }

    fn next_step(&self, index: usize) -> u64 {
        let mut reads = self
            .reads
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let step = reads.entry(index).or_insert(0);
        let current = *step;
        *step += 1;
        current
    }

    fn value_at(index: usize, step: u64) -> f64 {
        let (base, amplitude) = match index {
            0 => (21.0, 1.5),
            _ => (0.2 + 0.05 * index as f64, 0.02),
        };
        let phase = 0.1 * step as f64 + index as f64;
        // Round to millivolt resolution like the ADC would
        ((base + amplitude * phase.sin()) * 1000.0).round() / 1000.0
    }
}

#[async_trait]
impl ChannelReader for SimulatedReader {
    async fn read_channel(&self, index: usize) -> Result<f64, HardwareError> {
        if self.failing.contains(&index) {
            return Err(HardwareError::io(
                format!("simulated/channel{}", index),
                std::io::Error::new(std::io::ErrorKind::NotConnected, "sensor disconnected"),
            ));
        }
        Ok(Self::value_at(index, self.next_step(index)))
    }

    fn describe(&self) -> String {
        "simulated sensors".to_string()
    }
}
