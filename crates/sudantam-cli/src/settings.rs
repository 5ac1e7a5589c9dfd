//! CLI settings: `sudantam.toml` (optional), then `SUDANTAM__*` environment
//! variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File};
use serde::Deserialize;
use sudantam_core::LedgerConfig;

/// Default settings file, looked up in the working directory.
pub const DEFAULT_FILE: &str = "sudantam.toml";

/// Which adapter holds the patient rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    Sqlite,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreKind,
    /// Database or sheet path
    pub path: PathBuf,
    pub ledger: LedgerConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreKind::Sqlite,
            path: PathBuf::from("sudantam.db"),
            ledger: LedgerConfig::default(),
        }
    }
}

impl Settings {
    /// Load from `file` (or `sudantam.toml` if present) and the environment.
    pub fn load(file: Option<&Path>) -> anyhow::Result<Self> {
        let source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_FILE).required(false),
        };

        let settings = Config::builder()
            .add_source(source)
            .add_source(Environment::with_prefix("SUDANTAM").separator("__"))
            .build()
            .context("failed to read settings")?
            .try_deserialize::<Settings>()
            .context("invalid settings")?;

        Ok(settings)
    }
}
