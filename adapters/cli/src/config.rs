//! Resolution of the game configuration from file and command line.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use clap::ValueEnum;
use soul_collector_core::{GameConfig, SortStrategy};

/// Command-line spelling of the target ranking algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum SortArg {
    /// Adjacent exchange passes.
    Exchange,
    /// Insertion into a sorted prefix.
    Insertion,
}

impl From<SortArg> for SortStrategy {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Exchange => SortStrategy::ExchangeSort,
            SortArg::Insertion => SortStrategy::InsertionSort,
        }
    }
}

/// Values given on the command line that take precedence over the file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Overrides {
    pub(crate) seed: Option<u64>,
    pub(crate) grid_size: Option<u32>,
    pub(crate) sort: Option<SortArg>,
}

impl Overrides {
    fn apply(&self, config: &mut GameConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(grid_size) = self.grid_size {
            config.grid_size = grid_size;
        }
        if let Some(sort) = self.sort {
            config.sort_strategy = sort.into();
        }
    }
}

/// Loads the optional configuration file, applies overrides and validates the result.
pub(crate) fn resolve(path: Option<&Path>, overrides: &Overrides) -> Result<GameConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read configuration {}", path.display()))?;
            parse(&text)
                .with_context(|| format!("failed to load configuration {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate().context("invalid game configuration")?;
    Ok(config)
}

fn parse(text: &str) -> Result<GameConfig> {
    toml::from_str(text).context("failed to parse configuration TOML")
}
