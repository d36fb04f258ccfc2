use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use airsense::args::Args;
use airsense::config::Config;
use airsense::runtime::{RuntimeConfig, bind_listener, spawn_shutdown_handler};
use airsense::{SensorServer, create_default_config, load_config};

fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, env_overrides) = load_or_create_config(&args.config)?;
    args.apply_to(&mut config);

    let _log_guard = airsense::logging::init_logging(config.logging.file.as_deref());
    for var in env_overrides {
        info!("Config value overridden by {}", var);
    }

    info!(
        "Sampling {} channel(s) from {} source every {:?}",
        config.sampler.channels.len(),
        config.sampler.source,
        config.sampler.period
    );

    let rt = RuntimeConfig::from_args(Some(config.listener.threads)).build_runtime()?;
    rt.block_on(run_server(config))
}

/// Load the config file, writing a default one first if it does not exist
///
/// Logging is not installed yet, so problems go to stderr and the applied
/// environment overrides are returned for logging later.
fn load_or_create_config(path: &str) -> Result<(Config, Vec<&'static str>)> {
    if std::path::Path::new(path).exists() {
        return load_config(path).inspect_err(|e| {
            eprintln!("Failed to load config file '{}': {:#}", path, e);
        });
    }

    let default_config = create_default_config();
    let config_toml = toml::to_string_pretty(&default_config)?;
    std::fs::write(path, &config_toml)?;
    eprintln!("Config file '{}' not found, created default config", path);

    let mut config = default_config;
    let overridden =
        airsense::config::apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok((config, overridden))
}

async fn run_server(config: Config) -> Result<()> {
    let server = match SensorServer::from_config(&config) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start sensor server: {:#}", e);
            return Err(e);
        }
    };

    let listener = bind_listener(&config.listener.host, config.listener.port).await?;
    let (_shutdown_tx, shutdown_rx) = spawn_shutdown_handler();

    if let Err(e) = server.run(listener, shutdown_rx).await {
        warn!("Shutdown finished with error: {:#}", e);
        return Err(e);
    }

    Ok(())
}
