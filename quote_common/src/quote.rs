//! Quote-service reply pairs and durable price observations.
//!
//! A `QuotePair` is what the quote service sends back for one market: the
//! exchange-qualified pair symbol and its last price as a decimal string. A
//! `PriceObservation` is the record the ingestor persists, with the price
//! converted to fixed-point and truncated to [`PRICE_SCALE`] fractional digits.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::symbol::strip_quote;

/// Number of fractional digits kept for stored prices.
pub const PRICE_SCALE: u32 = 8;

/// Reply unit of the batch price endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePair {
    /// Pair symbol (e.g. `BTCUSDT`).
    pub symbol: String,
    /// Last price as sent by the service.
    pub price: String,
}

impl QuotePair {
    /// Creates a pair from anything string-like.
    pub fn new(symbol: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price: price.into(),
        }
    }
}

/// Durable price record, unique per `(base_symbol, quote_symbol, observed_at)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Tracked ticker (e.g. `BTC`).
    pub base_symbol: String,
    /// Settlement currency (e.g. `USDT`).
    pub quote_symbol: String,
    /// Price truncated to at most eight fractional digits.
    pub price: Decimal,
    /// Time the reply was converted, not the exchange timestamp.
    pub observed_at: DateTime<Utc>,
}

impl PriceObservation {
    /// Converts a quote-service pair into an observation priced in `quote`.
    pub fn from_pair(
        pair: &QuotePair,
        quote: &str,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            base_symbol: strip_quote(&pair.symbol, quote).to_string(),
            quote_symbol: quote.to_string(),
            price: parse_price(&pair.price)?,
            observed_at,
        })
    }
}

/// Parses a decimal price string and truncates it toward zero to
/// [`PRICE_SCALE`] fractional digits.
///
/// Extra fractional digits are cut from the text before parsing, since
/// `Decimal` rounds inputs longer than its 28-digit mantissa.
pub fn parse_price(text: &str) -> Result<Decimal, PipelineError> {
    let trimmed = text.trim();
    let kept = match trimmed.split_once('.') {
        Some((int, frac)) if frac.is_ascii() && frac.len() > PRICE_SCALE as usize => {
            &trimmed[..int.len() + 1 + PRICE_SCALE as usize]
        }
        _ => trimmed,
    };
    let value = Decimal::from_str(kept)
        .map_err(|e| PipelineError::Conversion(format!("{text:?}: {e}")))?;
    Ok(value.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::ToZero))
}
