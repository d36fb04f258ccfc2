//! Tokio runtime configuration and process-level utilities
//!
//! This module provides:
//! - Testable runtime configuration and builder logic
//! - Shutdown signal handling
//! - The TCP accept loop

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::session::{ConnectionRegistry, serve_connection};
use crate::types::{HostName, Port, ThreadCount};

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of worker threads
    worker_threads: usize,
}

impl RuntimeConfig {
    /// Create runtime config from optional thread count
    ///
    /// If `threads` is None, defaults to 1 thread.
    /// Single-threaded runtime is used if threads == 1.
    #[must_use]
    pub fn from_args(threads: Option<ThreadCount>) -> Self {
        let worker_threads = threads.map_or(ThreadCount::DEFAULT.get(), |t| t.get());
        Self { worker_threads }
    }

    /// Get number of worker threads
    #[must_use]
    pub const fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Check if single-threaded
    #[must_use]
    pub const fn is_single_threaded(&self) -> bool {
        self.worker_threads == 1
    }

    /// Build the tokio runtime
    ///
    /// Creates either a current-thread or multi-threaded runtime based on
    /// the configured worker thread count.
    ///
    /// # Errors
    /// Returns error if runtime creation fails
    pub fn build_runtime(self) -> Result<tokio::runtime::Runtime> {
        let rt = if self.is_single_threaded() {
            info!("Starting sensor server with single-threaded runtime");
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
        } else {
            let num_cpus = std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1);
            info!(
                "Starting sensor server with {} worker threads (detected {} CPUs)",
                self.worker_threads, num_cpus
            );
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(self.worker_threads)
                .enable_all()
                .build()?
        };

        Ok(rt)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_args(None)
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM on Unix)
///
/// If a handler cannot be installed that signal is never observed; the other
/// one still works.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Spawn a task that flips the returned channel to `true` on a shutdown signal
#[must_use]
pub fn spawn_shutdown_handler() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let notify = shutdown_tx.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        notify.send_replace(true);
    });

    (shutdown_tx, shutdown_rx)
}

/// Bind TCP listener and log startup information
///
/// # Errors
/// Returns error if binding fails
pub async fn bind_listener(host: &HostName, port: Port) -> Result<TcpListener> {
    let listen_addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;

    info!("Sensor server listening on {}", listen_addr);

    Ok(listener)
}

/// Run the accept loop for client connections
///
/// Spawns a task per connection. Exits when shutdown is signalled; accept
/// errors are logged and the loop keeps going.
pub async fn run_accept_loop(
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;

            _ = shutdown.wait_for(|stop| *stop) => {
                info!("Shutdown initiated, stopping accept loop");
                break;
            }

            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, addr)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                        }
                        tokio::spawn(serve_connection(stream, addr.to_string(), registry.clone()));
                    }
                    Err(e) => warn!("Failed to accept connection: {}", e),
                }
            }
        }
    }
}
