//! Sudantam front-desk CLI.
//!
//! Usage:
//!   sudantam register "Asha Rao" 30 --gender f --contact 9845012345
//!   sudantam visit 101 --tooth UR6 --tx Scaling --rx Amoxicillin --paid 500
//!   sudantam pay 101 300
//!   sudantam dues --csv

mod commands;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use settings::{Settings, StoreKind};

#[derive(Parser, Debug)]
#[command(name = "sudantam")]
#[command(about = "Dental clinic patient ledger and billing")]
struct Cli {
    /// Settings file (defaults to ./sudantam.toml when present)
    #[arg(long, env = "SUDANTAM_CONFIG")]
    config: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum)]
    store: Option<StoreKind>,

    /// Database or sheet path
    #[arg(long)]
    path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new patient
    Register {
        name: String,
        age: u32,
        /// m, f, o
        #[arg(long, default_value = "")]
        gender: String,
        #[arg(long, default_value = "")]
        contact: String,
        /// Medical history tag (repeatable)
        #[arg(long = "condition")]
        conditions: Vec<String>,
    },
    /// Edit a patient's details
    Update {
        id: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        contact: Option<String>,
        /// Replaces the whole medical history (repeatable)
        #[arg(long = "condition")]
        conditions: Option<Vec<String>>,
    },
    /// Record a visit
    Visit {
        id: u32,
        /// Tooth in FDI ("16") or quadrant form ("UR6") (repeatable)
        #[arg(long = "tooth")]
        teeth: Vec<String>,
        /// Diagnosis tag (repeatable)
        #[arg(long = "diagnosis")]
        diagnoses: Vec<String>,
        /// Procedure, optionally with a price: "Scaling" or "RCT=4000" (repeatable)
        #[arg(long = "tx")]
        treatments: Vec<String>,
        /// Medicine from the catalog, or "name|dosage|duration" (repeatable)
        #[arg(long = "rx")]
        prescriptions: Vec<String>,
        /// Amount collected now
        #[arg(long, default_value = "0")]
        paid: Decimal,
        #[arg(long, default_value = "")]
        notes: String,
        /// Next appointment, YYYY-MM-DD
        #[arg(long)]
        next: Option<chrono::NaiveDate>,
        /// Reuse a draft ID when retrying a failed save
        #[arg(long)]
        draft_id: Option<String>,
    },
    /// Record a payment against dues
    Pay { id: u32, amount: Decimal },
    /// Settle a patient's balance to zero
    Clear { id: u32 },
    /// Search by name or contact number
    Search {
        #[arg(default_value = "")]
        query: String,
        /// recent, oldest, name, dues
        #[arg(long, default_value = "recent")]
        sort: String,
    },
    /// Show a patient with their visit log
    Show { id: u32 },
    /// List patients with outstanding dues
    Dues {
        /// Print as CSV
        #[arg(long)]
        csv: bool,
    },
    /// Delete a patient and their history
    Delete { id: u32 },
    /// Invoice for the latest visit
    Invoice {
        id: u32,
        /// text, json, csv
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Check a patient's log against its hash chain
    Verify { id: u32 },
    /// Convert a tooth designator to FDI
    Tooth { designator: String },
    /// Search the procedure and medicine catalog
    Catalog {
        query: String,
        #[arg(long, default_value = "5")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sudantam=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        settings.store = store;
    }
    if let Some(path) = cli.path {
        settings.path = path;
    }
    tracing::debug!(store = ?settings.store, path = %settings.path.display(), "Using patient store");

    commands::run(&settings, cli.command)
}
