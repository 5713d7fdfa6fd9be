//! # Skirmish
//!
//! Headless arena simulation.
//!
//! Loads a TOML configuration (first argument, default `skirmish.toml`),
//! populates the arena from its spawn points, and runs a scripted player
//! against the enemy AI for the configured duration.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod player;
mod timing;

use anyhow::Result;
use skirmish_gameplay::CONFIG_FILE;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("skirmish=info".parse()?))
        .init();

    info!("Skirmish starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    app::run(&path)?;

    info!("Skirmish shutdown complete");
    Ok(())
}
