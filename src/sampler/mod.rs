//! Periodic sensor sampling
//!
//! The [`Sampler`] reads every configured channel once per period, stamps the
//! values with the current unix time and publishes the [`Reading`] to the
//! [`SampleStore`]. A channel that fails to read is reported as
//! [`FAILED_READ`] and the rest of the iteration carries on.

mod hardware;
mod mux_adc;
mod simulated;

pub use hardware::{ChannelReader, HardwareError};
pub use mux_adc::MuxAdcReader;
pub use simulated::SimulatedReader;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::constants::hardware::FAILED_READ;
use crate::store::{SampleStore, StoreResult};
use crate::types::{Reading, Timestamp, unix_now};

/// Shared view of whether a sampler loop is active
#[derive(Debug, Default)]
pub struct SamplerStatus {
    running: AtomicBool,
    iterations: AtomicU64,
}

impl SamplerStatus {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Completed sampling iterations
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }
}

/// Clears the running flag however the loop exits
struct RunningGuard<'a>(&'a SamplerStatus);

impl<'a> RunningGuard<'a> {
    fn new(status: &'a SamplerStatus) -> Self {
        status.running.store(true, Ordering::Release);
        Self(status)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
    }
}

/// Fixed-period acquisition loop
pub struct Sampler {
    reader: Arc<dyn ChannelReader>,
    store: Arc<SampleStore>,
    period: Duration,
    clock: fn() -> Timestamp,
    status: Arc<SamplerStatus>,
}

impl Sampler {
    pub fn new(reader: Arc<dyn ChannelReader>, store: Arc<SampleStore>, period: Duration) -> Self {
        Self {
            reader,
            store,
            period,
            clock: unix_now,
            status: Arc::new(SamplerStatus::default()),
        }
    }

    /// Replace the timestamp source
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> Timestamp) -> Self {
        self.clock = clock;
        self
    }

    /// Handle for observing the loop from elsewhere
    #[must_use]
    pub fn status(&self) -> Arc<SamplerStatus> {
        self.status.clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Read every channel once and publish the reading
    ///
    /// Channel failures are absorbed into the reading; only the publish
    /// result is returned.
    pub async fn sample_once(&self) -> StoreResult<Arc<Reading>> {
        let timestamp = (self.clock)();
        let channels = self.store.channels();
        let mut values = Vec::with_capacity(channels.len());

        for (index, channel) in channels.iter().enumerate() {
            let value = match self.reader.read_channel(index).await {
                Ok(value) => value,
                Err(e) => {
                    warn!(channel = %channel, "Sensor read failed: {}", e);
                    FAILED_READ
                }
            };
            values.push((channel.clone(), value));
        }

        self.store.publish(Reading::new(timestamp, values)).await
    }

    /// Sample every period until shutdown is signalled
    ///
    /// The first sample is taken immediately. Shutdown is only observed
    /// between iterations, so an iteration in progress always completes.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let _running = RunningGuard::new(&self.status);
        info!(
            "Sampler started: {} every {:?}",
            self.reader.describe(),
            self.period
        );

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait_for(|stop| *stop) => break,
                _ = interval.tick() => {}
            }

            match self.sample_once().await {
                Ok(reading) => debug!(
                    timestamp = reading.timestamp(),
                    channels = reading.len(),
                    "Published reading"
                ),
                Err(e) => error!("Failed to log reading: {}", e),
            }
            self.status.iterations.fetch_add(1, Ordering::Relaxed);
        }

        info!("Sampler stopped after {} iterations", self.status.iterations());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLog;
    use crate::types::ChannelName;

    fn store(names: &[&str]) -> (Arc<SampleStore>, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::new());
        let channels: Arc<[ChannelName]> = names
            .iter()
            .map(|n| ChannelName::new(n.to_string()).unwrap())
            .collect();
        (Arc::new(SampleStore::new(log.clone(), channels)), log)
    }

    fn fixed_clock() -> Timestamp {
        1_000
    }

    #[tokio::test]
    async fn test_sample_once_publishes_all_channels() {
        let (store, log) = store(&["Temp", "SN1", "SN2"]);
        let sampler = Sampler::new(
            Arc::new(SimulatedReader::new()),
            store.clone(),
            Duration::from_secs(3),
        )
        .with_clock(fixed_clock);

        let reading = sampler.sample_once().await.unwrap();
        assert_eq!(reading.timestamp(), 1_000);
        assert_eq!(reading.len(), 3);
        assert_eq!(store.snapshot().unwrap().timestamp(), 1_000);
        assert_eq!(log.row_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_channel_reports_sentinel() {
        let (store, _) = store(&["Temp", "SN1", "SN2"]);
        let reader = SimulatedReader::new().with_failing_channel(1);
        let sampler = Sampler::new(Arc::new(reader), store, Duration::from_secs(3))
            .with_clock(fixed_clock);

        let reading = sampler.sample_once().await.unwrap();
        assert_eq!(reading.get("SN1"), Some(-1.0));
        assert_ne!(reading.get("Temp"), Some(-1.0));
        assert!(reading.get("SN2").is_some());
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_current() {
        let (store, log) = store(&["Temp"]);
        log.set_offline(true);
        let sampler = Sampler::new(
            Arc::new(SimulatedReader::new()),
            store.clone(),
            Duration::from_secs(3),
        );

        assert!(sampler.sample_once().await.is_err());
        assert!(store.snapshot().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_samples_immediately_and_periodically() {
        let (store, _) = store(&["Temp"]);
        let sampler = Sampler::new(
            Arc::new(SimulatedReader::new()),
            store.clone(),
            Duration::from_secs(3),
        );
        let status = sampler.status();
        let (stop, shutdown) = watch::channel(false);

        let task = tokio::spawn(sampler.run(shutdown));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(status.is_running());
        assert_eq!(status.iterations(), 1);
        assert!(store.snapshot().is_some());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(status.iterations(), 3);

        stop.send_replace(true);
        task.await.unwrap();
        assert!(!status.is_running());
    }

    #[tokio::test]
    async fn test_run_exits_when_shutdown_sender_dropped() {
        let (store, _) = store(&["Temp"]);
        let sampler = Sampler::new(
            Arc::new(SimulatedReader::new()),
            store,
            Duration::from_secs(3600),
        );
        let (stop, shutdown) = watch::channel(false);
        let task = tokio::spawn(sampler.run(shutdown));
        drop(stop);
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }
}
