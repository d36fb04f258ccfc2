//! Sensor acquisition interface

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Errors reading one sensor channel
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HardwareError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unparsable value {value:?} in {}", .path.display())]
    Parse { path: PathBuf, value: String },

    #[error("channel {index} needs mux inputs beyond capacity {capacity}")]
    MuxCapacity { index: usize, capacity: usize },
}

impl HardwareError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Source of per-channel sensor values
///
/// `index` is the channel's position in the configured channel list. Calls
/// for different channels are never issued concurrently by the sampler, but
/// implementations must still be safe to share.
#[async_trait]
pub trait ChannelReader: Send + Sync {
    /// Read the current value of one channel
    async fn read_channel(&self, index: usize) -> Result<f64, HardwareError>;

    /// Short description for startup logging
    fn describe(&self) -> String;
}
