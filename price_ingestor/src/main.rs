//! Price ingestor — fetches current prices for every tracked symbol from the
//! quote service at the top of each hour and stores them in SQLite.
//!
//! Internally it wires together three building blocks:
//!
//! - `QuoteClient` — batch price calls with the single-retry rate-limit protocol.
//! - `SqliteStore` — idempotent observation writes and the tracked-symbol catalog.
//! - `IngestionJob` — the hourly state machine, run on a dedicated thread.
//!
//! Shutdown: Ctrl+C or SIGTERM sends on a crossbeam cancel channel. The job
//! observes it while waiting for the next hour or between cycles; the main
//! thread joins the job thread before exiting.
//!
//! Usage example (CLI):
//! ```bash
//! price_ingestor track BTC ETH DOGE
//! price_ingestor --config ./configs/app.toml run
//! price_ingestor latest BTC
//! ```
#![warn(missing_docs)]
mod args;

use crate::args::{Args, Command};
use clap::Parser;
use crossbeam_channel::bounded;
use log::{error, info};
use price_ingestor::{Config, IngestionJob, JobSettings, PriceStore, SqliteStore};
use quote_client::{QuoteClient, ReqwestTransport};
use quote_common::{PipelineError, Result, Symbol};
use std::sync::Arc;
use std::thread;

fn main() -> Result<(), PipelineError> {
    init_logger();
    let args = Args::parse();
    let config = Config::load(&args.config)?;

    if let Some(parent) = config.store.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = Arc::new(SqliteStore::open(&config.store.path)?);
    info!("Price store opened at {}", config.store.path.display());

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&config, store),
        Command::Once => {
            let job = build_job(&config, store)?;
            let report = job.run_cycle()?;
            info!(
                "Cycle finished: {} symbols, {} batches, {} observations",
                report.symbols, report.batches, report.observations
            );
            Ok(())
        }
        Command::Track { symbols } => {
            for raw in symbols {
                let symbol: Symbol = raw.parse()?;
                if store.track_symbol(&symbol)? {
                    info!("Tracking {}", symbol);
                } else {
                    info!("{} is already tracked", symbol);
                }
            }
            Ok(())
        }
        Command::Latest { symbol } => {
            let symbol: Symbol = symbol.parse()?;
            let obs = store.latest_price(&symbol)?;
            let json = serde_json::to_string_pretty(&obs)
                .map_err(|e| PipelineError::Format(e.to_string()))?;
            println!("{json}");
            Ok(())
        }
    }
}

fn build_job(
    config: &Config,
    store: Arc<SqliteStore>,
) -> Result<IngestionJob<QuoteClient<ReqwestTransport>, Arc<SqliteStore>>> {
    let transport = ReqwestTransport::new(
        &config.quote_service.base_url,
        config.quote_service.timeout(),
    )?;
    let client = QuoteClient::new(transport).quote_currency(&config.job.settlement_currency);
    let settings = JobSettings {
        batch_size: config.job.batch_size,
        quote_currency: config.job.settlement_currency.clone(),
    };
    Ok(IngestionJob::new(client, store, settings))
}

fn run(config: &Config, store: Arc<SqliteStore>) -> Result<()> {
    let mut job = build_job(config, store)?;
    let (cancel_tx, cancel_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        info!("Termination signal received. Shutting down ingestor...");
        let _ = cancel_tx.try_send(());
    })
    .map_err(|e| PipelineError::Format(format!("Error setting Ctrl+C handler: {e}")))?;

    info!(
        "Ingestor started against {} (batch size {})",
        config.quote_service.base_url, config.job.batch_size
    );
    let handle = thread::Builder::new()
        .name("hourly-job".into())
        .spawn(move || job.run(&cancel_rx))?;

    match handle.join() {
        Ok(summary) => {
            info!(
                "Ingestor is shut down ({} cycles, {} failed)",
                summary.cycles, summary.failed
            );
            Ok(())
        }
        Err(_) => {
            error!("Hourly job thread panicked");
            Err(PipelineError::Format("hourly job thread panicked".into()))
        }
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
