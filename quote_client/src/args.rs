//! Command-line arguments for the quote client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about = "Fetch live prices from the quote service", long_about = None)]
pub struct Args {
    /// Base URL of the quote service.
    #[clap(long, env = "QUOTE_SERVICE_URL", default_value = "https://api.binance.com")]
    pub base_url: String,

    /// Comma separated symbols, e.g. `BTC,ETH`.
    #[clap(long, conflicts_with = "path")]
    pub symbols: Option<String>,

    /// Path to a text file with symbols.
    /// Symbols may be separated by commas, spaces, or new lines.
    #[clap(long)]
    pub path: Option<String>,

    /// Quote currency appended to every symbol.
    #[clap(long, default_value = "USDT")]
    pub quote: String,

    /// Request timeout in seconds.
    #[clap(long, default_value_t = 30)]
    pub timeout_secs: u64,
}
