#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Soul Collector headlessly.

mod autoplay;
mod config;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    autoplay::Plan,
    config::{Overrides, SortArg},
};

/// Headless Soul Collector runner.
#[derive(Debug, Parser)]
#[command(name = "soul-collector", version, about)]
struct Args {
    /// TOML file with game settings; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed overriding the configured board seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Board side length overriding the configured one.
    #[arg(long)]
    grid_size: Option<u32>,
    /// Target ranking algorithm overriding the configured one.
    #[arg(long, value_enum)]
    sort: Option<SortArg>,
    /// Maximum player moves before the run stops.
    #[arg(long, default_value_t = 200)]
    steps: u32,
    /// Simulated frame length in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Prints the effective configuration as TOML instead of playing.
    #[arg(long)]
    dump_config: bool,
}

/// Entry point for the Soul Collector command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let overrides = Overrides {
        seed: args.seed,
        grid_size: args.grid_size,
        sort: args.sort,
    };
    let config = config::resolve(args.config.as_deref(), &overrides)?;

    if args.dump_config {
        let text = toml::to_string_pretty(&config).context("failed to serialise configuration")?;
        print!("{text}");
        return Ok(());
    }

    let plan = Plan {
        max_moves: args.steps,
        tick: Duration::from_millis(args.tick_ms),
    };
    let summary = autoplay::run(config, &plan)?;
    println!("{summary}");
    Ok(())
}
