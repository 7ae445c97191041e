//! Quote Client — fetches current prices for a handful of symbols straight from
//! the quote service and prints them to stdout. Symbols come either from
//! `--symbols` or from a text file; more than [`MAX_BATCH_SIZE`] symbols are split
//! into several batch calls, each subject to the single-retry rate-limit protocol.
//!
//! Usage example (CLI):
//! ```bash
//! quote_client --symbols btc,eth,doge
//! quote_client --base-url https://api.binance.com --path ./symbols.txt
//! ```
#![warn(missing_docs)]
mod args;

use crate::args::Args;
use clap::Parser;
use log::{error, info};
use quote_client::{QuoteClient, QuoteSource, ReqwestTransport};
use quote_common::batch::{MAX_BATCH_SIZE, partition};
use quote_common::symbol::{SymbolParser, parse_symbol_list};
use quote_common::{PipelineError, Result, Symbol};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

fn main() -> Result<(), PipelineError> {
    init_logger();
    let args = Args::parse();

    let symbols = load_symbols(&args)?;
    if symbols.is_empty() {
        return Err(PipelineError::Format(
            "no symbols given, use --symbols or --path".into(),
        ));
    }
    info!("Symbols: {:?}", symbols);

    let transport = ReqwestTransport::new(&args.base_url, Duration::from_secs(args.timeout_secs))?;
    let client = QuoteClient::new(transport).quote_currency(&args.quote);

    if let [symbol] = symbols.as_slice() {
        let pair = client.fetch_last_price(symbol)?;
        println!("{} {}", pair.symbol, pair.price);
        return Ok(());
    }

    for batch in partition(&symbols, MAX_BATCH_SIZE) {
        match client.fetch_batch(batch) {
            Ok(pairs) => {
                for pair in pairs {
                    println!("{} {}", pair.symbol, pair.price);
                }
            }
            Err(e) => {
                error!("Failed to retrieve price for batch {:?}: {}", batch, e);
                return Err(e);
            }
        }
    }
    Ok(())
}

fn load_symbols(args: &Args) -> Result<Vec<Symbol>> {
    if let Some(list) = &args.symbols {
        return parse_symbol_list(list);
    }
    let Some(raw) = &args.path else {
        return Ok(Vec::new());
    };
    let file_path = normalize_path(raw);
    if !is_file_exist(&file_path) {
        return Err(PipelineError::Format(format!(
            "symbol file {} does not exist",
            file_path.display()
        )));
    }
    let file = File::open(&file_path)?;
    Symbol::parse_from_file(BufReader::new(file))
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
///
/// This allows passing Windows paths in quotes without breaking parsing.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}

/// Returns `true` if the provided path exists and is a regular file.
fn is_file_exist(path: &PathBuf) -> bool {
    path.exists() && path.is_file()
}
