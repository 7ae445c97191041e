//! Command-line arguments for the price ingestor.
use clap::{Parser, Subcommand};
use price_ingestor::config::DEFAULT_CONFIG_PATH;
use std::path::PathBuf;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about = "Hourly price ingestion", long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file.
    #[clap(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// What to do; defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Ingestor subcommands.
#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Run the hourly job until Ctrl+C / SIGTERM.
    Run,
    /// Run a single ingestion cycle immediately and exit.
    Once,
    /// Add symbols to the tracked catalog.
    Track {
        /// Symbols to track, e.g. `BTC ETH`.
        #[clap(required = true)]
        symbols: Vec<String>,
    },
    /// Print the most recent stored observation for a symbol.
    Latest {
        /// Symbol to look up.
        symbol: String,
    },
}
