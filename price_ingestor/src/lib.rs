//! Hourly price ingestion.
//!
//! Wires the quote client to a durable price store on a wall-clock schedule:
//!
//! - `config` — TOML settings with environment overrides.
//! - `store` — `PriceStore` trait and its SQLite implementation.
//! - `schedule` — next-hour trigger computation and the `Clock` seam.
//! - `job` — the `IngestionJob` state machine and its per-cycle orchestration.
#![warn(missing_docs)]
pub mod config;
pub mod job;
pub mod schedule;
pub mod store;

pub use config::Config;
pub use job::{CycleReport, IngestionJob, JobSettings, JobState, RunSummary};
pub use store::{PriceStore, SqliteStore};
