//! Ticker symbols and helpers shared between the quote client and the ingestor.
//!
//! A [`Symbol`] is an upper-case alphabetic ticker of one to five characters
//! (`BTC`, `ETH`, `DOGE`). The quote service addresses markets by the pair symbol,
//! which is the base symbol followed by the settlement currency (`BTCUSDT`).

use std::collections::HashSet;
use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Quote currency every tracked symbol is priced in.
pub const SETTLEMENT_CURRENCY: &str = "USDT";

/// Longest accepted ticker.
pub const MAX_SYMBOL_LEN: usize = 5;

/// Validated ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Returns the ticker as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the exchange-qualified pair symbol, e.g. `BTC` + `USDT` = `BTCUSDT`.
    pub fn pair_with(&self, quote: &str) -> String {
        format!("{}{}", self.0, quote)
    }
}

impl FromStr for Symbol {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let candidate = s.trim().to_ascii_uppercase();
        let valid = (1..=MAX_SYMBOL_LEN).contains(&candidate.len())
            && candidate.bytes().all(|b| b.is_ascii_uppercase());
        if !valid {
            return Err(PipelineError::InvalidSymbol(s.trim().to_string()));
        }
        Ok(Symbol(candidate))
    }
}

impl TryFrom<String> for Symbol {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strips the quote currency from a pair symbol (`BTCUSDT` -> `BTC`).
///
/// A pair that does not end with `quote` is returned unchanged.
pub fn strip_quote<'a>(pair: &'a str, quote: &str) -> &'a str {
    pair.strip_suffix(quote).unwrap_or(pair)
}

/// Trait providing file parsing for symbols.
pub trait SymbolParser {
    /// Parses symbols from a buffered reader.
    ///
    /// Symbols may be separated by new lines, commas or spaces. Duplicates are
    /// dropped, keeping the first occurrence. Returns an error if any entry is
    /// not a valid symbol.
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Symbol>, PipelineError>;
}

impl SymbolParser for Symbol {
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Self>, PipelineError> {
        let mut symbols = Vec::new();

        for line_result in reader.lines() {
            let line = line_result.map_err(PipelineError::Io)?;
            for entry in line.split(|c: char| c == ',' || c.is_whitespace()) {
                if entry.is_empty() {
                    continue;
                }
                symbols.push(entry.parse::<Self>()?);
            }
        }
        Ok(dedup(symbols))
    }
}

/// Parses comma separated user input such as `"btc, eth ,doge"`.
pub fn parse_symbol_list(input: &str) -> Result<Vec<Symbol>, PipelineError> {
    let symbols = input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<Vec<Symbol>, _>>()?;
    Ok(dedup(symbols))
}

/// Removes duplicates while preserving the order of first occurrence.
pub fn dedup(symbols: Vec<Symbol>) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
