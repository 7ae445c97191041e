//! Quote client for the batch price endpoint.
//!
//! `QuoteClient` turns a batch of tracked symbols into one `GET
//! /api/v3/ticker/price?symbols=[...]` call, runs it through the single-retry
//! rate-limit protocol and decodes the reply into [`QuotePair`] values.
use log::{debug, error};
use quote_common::batch::encode_batch_query;
use quote_common::{PipelineError, QuotePair, Result, SETTLEMENT_CURRENCY, Symbol};
use serde::de::DeserializeOwned;

use crate::rate_limit::send_with_rate_limit;
use crate::transport::{HttpTransport, Sleeper, ThreadSleeper};

/// Path of the last-price endpoint.
pub const PRICE_PATH: &str = "/api/v3/ticker/price";

/// Source of current prices for tracked symbols.
pub trait QuoteSource {
    /// Fetches the last price for every symbol of `batch` in one call.
    ///
    /// The service may omit symbols it has no market for; absence is not an error.
    fn fetch_batch(&self, batch: &[Symbol]) -> Result<Vec<QuotePair>>;

    /// Fetches the last price of a single symbol.
    fn fetch_last_price(&self, symbol: &Symbol) -> Result<QuotePair>;
}

impl<Q: QuoteSource + ?Sized> QuoteSource for &Q {
    fn fetch_batch(&self, batch: &[Symbol]) -> Result<Vec<QuotePair>> {
        (**self).fetch_batch(batch)
    }

    fn fetch_last_price(&self, symbol: &Symbol) -> Result<QuotePair> {
        (**self).fetch_last_price(symbol)
    }
}

impl<Q: QuoteSource + ?Sized> QuoteSource for Box<Q> {
    fn fetch_batch(&self, batch: &[Symbol]) -> Result<Vec<QuotePair>> {
        (**self).fetch_batch(batch)
    }

    fn fetch_last_price(&self, symbol: &Symbol) -> Result<QuotePair> {
        (**self).fetch_last_price(symbol)
    }
}

/// Rate-limit-aware client for the quote service.
pub struct QuoteClient<T, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    quote_currency: String,
}

impl<T: HttpTransport> QuoteClient<T> {
    /// Creates a client that prices symbols in the settlement currency and
    /// waits out rate limits on the calling thread.
    pub fn new(transport: T) -> Self {
        Self::with_sleeper(transport, ThreadSleeper)
    }
}

impl<T: HttpTransport, S: Sleeper> QuoteClient<T, S> {
    /// Creates a client with a custom sleeper.
    pub fn with_sleeper(transport: T, sleeper: S) -> Self {
        Self {
            transport,
            sleeper,
            quote_currency: SETTLEMENT_CURRENCY.to_string(),
        }
    }

    /// Overrides the quote currency appended to every symbol.
    pub fn quote_currency(mut self, quote: &str) -> Self {
        self.quote_currency = quote.to_string();
        self
    }

    fn get_json<D: DeserializeOwned>(&self, query: &[(&str, &str)]) -> Result<D> {
        let response = send_with_rate_limit(&self.transport, &self.sleeper, PRICE_PATH, query)
            .inspect_err(|e| error!("Failed to get last price: {}", e))?;
        serde_json::from_slice(&response.body).map_err(|e| {
            error!("Failed to unmarshal response: {}", e);
            PipelineError::Decode(e.to_string())
        })
    }
}

impl<T: HttpTransport, S: Sleeper> QuoteSource for QuoteClient<T, S> {
    fn fetch_batch(&self, batch: &[Symbol]) -> Result<Vec<QuotePair>> {
        let symbols = encode_batch_query(batch, &self.quote_currency);
        debug!("Requesting batch {}", symbols);
        let pairs: Vec<QuotePair> = self.get_json(&[("symbols", symbols.as_str())])?;
        debug!("Batch returned {} of {} pairs", pairs.len(), batch.len());
        Ok(pairs)
    }

    fn fetch_last_price(&self, symbol: &Symbol) -> Result<QuotePair> {
        let pair = symbol.pair_with(&self.quote_currency);
        self.get_json(&[("symbol", pair.as_str())])
    }
}
