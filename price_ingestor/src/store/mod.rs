//! Persistence boundary for price observations and the tracked-symbol catalog.
//!
//! - `PriceStore` — what the ingestion job and read-side collaborators need.
//! - `sqlite` — SQLite implementation with insert-or-ignore observations.
//!
//! Writes are idempotent: storing an observation whose
//! `(base_symbol, quote_symbol, observed_at)` key already exists leaves the first
//! row untouched. Reads see completed writes immediately; nothing caches between
//! the two.

pub mod sqlite;

use std::sync::Arc;

use quote_common::{PriceObservation, Result, Symbol};

pub use sqlite::SqliteStore;

/// Storage operations used by the ingestion job and its collaborators.
pub trait PriceStore {
    /// Inserts `obs` unless its key already exists.
    ///
    /// Returns `true` when a new row was written, `false` for a duplicate.
    /// Failures are `StoreWrite` errors.
    fn upsert_price_observation(&self, obs: &PriceObservation) -> Result<bool>;

    /// Lists the tracked symbols, distinct and in ascending order.
    /// Failures are `CatalogRead` errors.
    fn tracked_symbols(&self) -> Result<Vec<Symbol>>;

    /// Returns the most recent observation for `symbol`, or `NotFound`.
    fn latest_price(&self, symbol: &Symbol) -> Result<PriceObservation>;

    /// Adds `symbol` to the catalog. Returns `false` if it was already tracked.
    fn track_symbol(&self, symbol: &Symbol) -> Result<bool>;
}

impl<S: PriceStore + ?Sized> PriceStore for &S {
    fn upsert_price_observation(&self, obs: &PriceObservation) -> Result<bool> {
        (**self).upsert_price_observation(obs)
    }

    fn tracked_symbols(&self) -> Result<Vec<Symbol>> {
        (**self).tracked_symbols()
    }

    fn latest_price(&self, symbol: &Symbol) -> Result<PriceObservation> {
        (**self).latest_price(symbol)
    }

    fn track_symbol(&self, symbol: &Symbol) -> Result<bool> {
        (**self).track_symbol(symbol)
    }
}

impl<S: PriceStore + ?Sized> PriceStore for Arc<S> {
    fn upsert_price_observation(&self, obs: &PriceObservation) -> Result<bool> {
        (**self).upsert_price_observation(obs)
    }

    fn tracked_symbols(&self) -> Result<Vec<Symbol>> {
        (**self).tracked_symbols()
    }

    fn latest_price(&self, symbol: &Symbol) -> Result<PriceObservation> {
        (**self).latest_price(symbol)
    }

    fn track_symbol(&self, symbol: &Symbol) -> Result<bool> {
        (**self).track_symbol(symbol)
    }
}
