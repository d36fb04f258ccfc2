//! Sensor server composition
//!
//! [`SensorServer`] wires the sample store, sampler, broadcast loop and
//! connection registry together from a [`Config`] and runs them until
//! shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::broadcast::BroadcastLoop;
use crate::config::{Config, SensorSource, StorageBackend};
use crate::protocol::LineEncoder;
use crate::runtime::run_accept_loop;
use crate::sampler::{ChannelReader, MuxAdcReader, Sampler, SamplerStatus, SimulatedReader};
use crate::session::ConnectionRegistry;
use crate::store::{MemoryLog, SampleLog, SampleStore, SqliteLog};
use crate::types::ChannelName;

/// All long-lived server components
pub struct SensorServer {
    registry: Arc<ConnectionRegistry>,
    store: Arc<SampleStore>,
    sampler: Sampler,
    broadcast: BroadcastLoop,
}

impl std::fmt::Debug for SensorServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorServer")
            .field("connections", &self.registry.len())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl SensorServer {
    /// Open storage and the sensor source named by `config`
    ///
    /// # Errors
    /// Returns error if the database or the sensor hardware cannot be opened
    pub fn from_config(config: &Config) -> Result<Self> {
        let channels = &config.sampler.channels;

        let log: Arc<dyn SampleLog> = match config.storage.backend {
            StorageBackend::Sqlite => Arc::new(
                SqliteLog::open(&config.storage.path, channels).with_context(|| {
                    format!("Failed to open database {}", config.storage.path.display())
                })?,
            ),
            StorageBackend::Memory => {
                warn!("Using in-memory storage; history is lost on restart");
                Arc::new(MemoryLog::new())
            }
        };

        let reader: Arc<dyn ChannelReader> = match config.sampler.source {
            SensorSource::Simulated => Arc::new(SimulatedReader::new()),
            SensorSource::MuxAdc => {
                let reader = MuxAdcReader::open(&config.sampler.mux_adc)
                    .context("Failed to open multiplexed ADC")?;
                if channels.len() > reader.channel_capacity() {
                    return Err(anyhow::anyhow!(
                        "{} channels configured but the mux serves only {}",
                        channels.len(),
                        reader.channel_capacity()
                    ));
                }
                Arc::new(reader)
            }
        };

        Ok(Self::new(config, reader, log))
    }

    /// Build a server around an existing sensor source and log
    pub fn new(config: &Config, reader: Arc<dyn ChannelReader>, log: Arc<dyn SampleLog>) -> Self {
        let channels: Arc<[ChannelName]> = config.sampler.channels.iter().cloned().collect();
        let registry = Arc::new(ConnectionRegistry::with_write_timeout(
            config.link.write_timeout,
        ));
        let store = Arc::new(SampleStore::new(log, channels.clone()));
        let sampler = Sampler::new(reader, store.clone(), config.sampler.period);
        let broadcast = BroadcastLoop::new(
            registry.clone(),
            store.clone(),
            LineEncoder::new(config.broadcast.format, channels),
            config.link.baud_rate,
            config.broadcast.period,
        );

        Self {
            registry,
            store,
            sampler,
            broadcast,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SampleStore> {
        &self.store
    }

    #[must_use]
    pub fn sampler_status(&self) -> Arc<SamplerStatus> {
        self.sampler.status()
    }

    /// Serve clients on `listener` until `shutdown` becomes true
    ///
    /// Shutdown drains before it stops: accepting ends first, then the sampler
    /// and broadcast loops finish their current iteration, then every
    /// remaining connection is closed. Storage and hardware are released when
    /// the last component is dropped on return.
    pub async fn run(self, listener: TcpListener, shutdown: watch::Receiver<bool>) -> Result<()> {
        let Self {
            registry,
            store,
            sampler,
            broadcast,
        } = self;

        let sampler_task = tokio::spawn(sampler.run(shutdown.clone()));
        let broadcast_task = tokio::spawn(broadcast.run(shutdown.clone()));

        run_accept_loop(listener, registry.clone(), shutdown).await;

        sampler_task.await.context("Sampler task failed")?;
        broadcast_task.await.context("Broadcast task failed")?;

        let closed = registry.close_all().await;
        info!("Closed {} client connection(s)", closed);

        drop(store);
        info!("Sensor server shutdown complete");
        Ok(())
    }
}
