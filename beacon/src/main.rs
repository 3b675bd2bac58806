//! # Beacon
//!
//! Loads the config, then runs a multi-threaded soak simulation against the
//! entity tracking index and reports what it saw.
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    missing_docs,
    clippy::unwrap_used
)]
#![allow(
    clippy::single_call_fn,
    clippy::multiple_inherent_impl,
    clippy::shadow_unrelated,
    clippy::missing_errors_doc,
    clippy::needless_pass_by_value,
    clippy::cargo_common_metadata
)]

use std::{env, path::PathBuf};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::BeaconConfig;
use crate::simulation::Simulation;

mod config;
mod simulation;

const DEFAULT_CONFIG_PATH: &str = "beacon_config.json5";

fn init_logging() -> anyhow::Result<()> {
    // route `log` records from the libraries into tracing
    tracing_log::LogTracer::init().context("failed to install log bridge")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let path = env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = BeaconConfig::load_or_create(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        bucket_kind = ?config.tracking.bucket_kind,
        entity_view_distance = config.tracking.entity_view_distance,
        "Loaded config"
    );

    let simulation = Simulation::new(&config.tracking, config.simulation)?;
    let report = simulation.run()?;

    tracing::info!(
        ticks = report.ticks,
        entered = report.entered,
        exited = report.exited,
        crossings = report.crossings,
        respawns = report.respawns,
        populated_chunks = report.populated_chunks,
        "Simulation finished in {:.2?}",
        report.elapsed
    );
    Ok(())
}
