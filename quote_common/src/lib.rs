//!
//! Common types and utilities shared by the quote client and the price ingestor.
//!
//! This crate aggregates:
//! - `error` — unified error type `PipelineError` used across the workspace.
//! - `result` — handy `Result<T, PipelineError>` alias.
//! - `symbol` — validated ticker symbols and parsing helpers.
//! - `quote` — quote-service reply pairs and durable price observations.
//! - `batch` — partitioning of the tracked symbols into quote-service batches.
#![warn(missing_docs)]
pub mod batch;
pub mod error;
pub mod quote;
pub mod result;
pub mod symbol;

pub use error::{ErrorKind, PipelineError};
pub use quote::{PriceObservation, QuotePair};
pub use result::Result;
pub use symbol::{SETTLEMENT_CURRENCY, Symbol};
