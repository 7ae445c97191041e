//! Error types shared by the quote client and the price ingestor.
//!
//! The `PipelineError` enum unifies every failure an ingestion cycle can run into
//! (catalog reads, quote-service calls, price conversion, store writes) together
//! with the ambient I/O and configuration failures, so crates can propagate a
//! single error type with `?`.
use std::io;
use std::sync::PoisonError;

use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Unified error type shared by the workspace.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The tracked-symbol catalog could not be listed.
    #[error("Catalog read error: {0}")]
    CatalogRead(String),

    /// Transport failure or a non-2xx status outside the rate-limit flow.
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not match the expected pair-list shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The quote service kept rate-limiting after the single allowed retry,
    /// or sent no usable wait duration.
    #[error("Rate limit exhausted: {0}")]
    RateLimitExhausted(String),

    /// A price string could not be converted to a fixed-point decimal.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// A price observation could not be persisted.
    #[error("Store write error: {0}")]
    StoreWrite(String),

    /// The price store could not be opened or read.
    #[error("Store error: {0}")]
    Store(String),

    /// No observation exists for the requested symbol.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input is not a valid ticker symbol.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Configuration file could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error originating from the standard library or files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),
}

/// Discriminant of [`PipelineError`] without its payload.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    CatalogRead,
    Network,
    Decode,
    RateLimitExhausted,
    Conversion,
    StoreWrite,
    Store,
    NotFound,
    InvalidSymbol,
    Config,
    Io,
    Format,
    MutexLock,
}

impl PipelineError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::CatalogRead(_) => ErrorKind::CatalogRead,
            PipelineError::Network(_) => ErrorKind::Network,
            PipelineError::Decode(_) => ErrorKind::Decode,
            PipelineError::RateLimitExhausted(_) => ErrorKind::RateLimitExhausted,
            PipelineError::Conversion(_) => ErrorKind::Conversion,
            PipelineError::StoreWrite(_) => ErrorKind::StoreWrite,
            PipelineError::Store(_) => ErrorKind::Store,
            PipelineError::NotFound(_) => ErrorKind::NotFound,
            PipelineError::InvalidSymbol(_) => ErrorKind::InvalidSymbol,
            PipelineError::Config(_) => ErrorKind::Config,
            PipelineError::Io(_) => ErrorKind::Io,
            PipelineError::Format(_) => ErrorKind::Format,
            PipelineError::MutexLock(_) => ErrorKind::MutexLock,
        }
    }
}

impl<T> From<PoisonError<T>> for PipelineError {
    fn from(err: PoisonError<T>) -> Self {
        PipelineError::MutexLock(err.to_string())
    }
}
