//! # Wildspawn Host
//!
//! Headless host that drives spawn engines over simulated shards.
//!
//! Each shard owns an in-memory world with wandering players and one
//! spawn engine. The host reports metrics periodically, simulates world
//! saves and flushes every engine on exit.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod shard;

use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{HostConfig, CONFIG_FILE};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("wildspawn=info".parse()?))
        .init();

    info!("Wildspawn host starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = HostConfig::load_from(&config_path);
    if !Path::new(&config_path).exists() {
        if let Err(e) = config.save_to(&config_path) {
            warn!("Could not write default config to {config_path}: {e}");
        }
    }

    app::run(config)?;

    info!("Wildspawn host shutdown complete");
    Ok(())
}
