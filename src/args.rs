//! Command-line argument parsing
//!
//! Every flag is optional and overrides the matching config file entry.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::protocol::OutputFormat;
use crate::types::{HostName, Port, ThreadCount};

/// Parse port from command line argument
fn parse_port(s: &str) -> Result<Port, String> {
    s.parse::<Port>().map_err(|e| format!("Invalid port: {}", e))
}

/// Parse host from command line argument
fn parse_host(s: &str) -> Result<HostName, String> {
    s.parse::<HostName>().map_err(|e| e.to_string())
}

/// Air-quality sensor streaming server
#[derive(Parser, Debug, Clone)]
#[command(name = "airsense", version, about)]
pub struct Args {
    /// Configuration file path (written with defaults if missing)
    #[arg(short, long, default_value = "config.toml", env = "AIRSENSE_CONFIG")]
    pub config: String,

    /// Port to listen on (overrides config file)
    #[arg(short, long, value_parser = parse_port)]
    pub port: Option<Port>,

    /// Host to bind to (overrides config file)
    #[arg(long, value_parser = parse_host)]
    pub host: Option<HostName>,

    /// Real-time output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// SQLite database file (overrides config file)
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Number of worker threads (default: 1, use 0 for CPU cores)
    #[arg(short, long, env = "AIRSENSE_THREADS")]
    pub threads: Option<ThreadCount>,
}

impl Args {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        if let Some(format) = self.output {
            config.broadcast.format = format;
        }
        if let Some(path) = &self.database {
            config.storage.path = path.clone();
        }
        if let Some(threads) = self.threads {
            config.listener.threads = threads;
        }
    }
}
