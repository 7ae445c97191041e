//! SQLite-backed [`PriceStore`].
//!
//! The connection sits behind a `Mutex`, so the ingestion thread and any reader
//! are serialized on it. Every write runs in its own transaction that is rolled
//! back if the statement fails.
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::DateTime;
use log::{debug, warn};
use quote_common::{PipelineError, PriceObservation, Result, Symbol};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use rust_decimal::Decimal;

use super::PriceStore;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS coin (
        ticker TEXT PRIMARY KEY NOT NULL
    );
    CREATE TABLE IF NOT EXISTS one_hour_price (
        fromsym    TEXT    NOT NULL,
        tosym      TEXT    NOT NULL,
        last_price TEXT    NOT NULL,
        ts         INTEGER NOT NULL,
        PRIMARY KEY (fromsym, tosym, ts)
    );
";

const INSERT_PRICE: &str = "
    INSERT OR IGNORE INTO one_hour_price (fromsym, tosym, last_price, ts)
    VALUES (?1, ?2, ?3, ?4)
";

const SELECT_LATEST: &str = "
    SELECT fromsym, tosym, last_price, ts FROM one_hour_price
    WHERE fromsym = ?1 ORDER BY ts DESC LIMIT 1
";

/// SQLite price store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            PipelineError::Store(format!("failed to open database {}: {e}", path.display()))
        })?;
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| PipelineError::Store(format!("failed to open database: {e}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| PipelineError::Store(format!("failed to apply schema: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` inside a transaction, committing only if it succeeds.
    /// SQLite failures are turned into store errors by `on_err`.
    fn safe_tx<T>(
        &self,
        on_err: impl FnOnce(rusqlite::Error) -> PipelineError,
        f: impl FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let mut conn = self.conn.lock()?;
        let result = conn.transaction().and_then(|tx| {
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        });
        result.map_err(on_err)
    }
}

fn row_to_observation(
    fromsym: String,
    tosym: String,
    last_price: String,
    ts: i64,
) -> Result<PriceObservation> {
    let price = Decimal::from_str(&last_price)
        .map_err(|e| PipelineError::Store(format!("stored price {last_price:?}: {e}")))?;
    let observed_at = DateTime::from_timestamp_micros(ts)
        .ok_or_else(|| PipelineError::Store(format!("stored timestamp {ts} out of range")))?;
    Ok(PriceObservation {
        base_symbol: fromsym,
        quote_symbol: tosym,
        price,
        observed_at,
    })
}

impl PriceStore for SqliteStore {
    fn upsert_price_observation(&self, obs: &PriceObservation) -> Result<bool> {
        let inserted = self.safe_tx(
            |e| {
                PipelineError::StoreWrite(format!(
                    "failed to insert price for {}->{}: {e}",
                    obs.base_symbol, obs.quote_symbol
                ))
            },
            |tx| {
                tx.execute(
                    INSERT_PRICE,
                    params![
                        obs.base_symbol,
                        obs.quote_symbol,
                        obs.price.to_string(),
                        obs.observed_at.timestamp_micros()
                    ],
                )
            },
        )?;
        if inserted == 0 {
            debug!(
                "Price for {}->{} at {} already stored",
                obs.base_symbol, obs.quote_symbol, obs.observed_at
            );
        }
        Ok(inserted > 0)
    }

    fn tracked_symbols(&self) -> Result<Vec<Symbol>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| PipelineError::CatalogRead(e.to_string()))?;
        let tickers = conn
            .prepare("SELECT DISTINCT ticker FROM coin ORDER BY ticker")
            .and_then(|mut stmt| {
                let rows = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<String>>>();
                rows
            })
            .map_err(|e| PipelineError::CatalogRead(format!("failed to get tickers: {e}")))?;

        Ok(tickers
            .into_iter()
            .filter_map(|ticker| match ticker.parse::<Symbol>() {
                Ok(symbol) => Some(symbol),
                Err(e) => {
                    warn!("Skipping catalog entry: {}", e);
                    None
                }
            })
            .collect())
    }

    fn latest_price(&self, symbol: &Symbol) -> Result<PriceObservation> {
        let conn = self.conn.lock()?;
        let row: Option<(String, String, String, i64)> = conn
            .query_row(SELECT_LATEST, params![symbol.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .optional()
            .map_err(|e| {
                PipelineError::Store(format!("failed to get last price for {symbol}: {e}"))
            })?;
        drop(conn);
        match row {
            Some((fromsym, tosym, last_price, ts)) => {
                row_to_observation(fromsym, tosym, last_price, ts)
            }
            None => Err(PipelineError::NotFound(format!("no price found for symbol {symbol}"))),
        }
    }

    fn track_symbol(&self, symbol: &Symbol) -> Result<bool> {
        let inserted = self.safe_tx(
            |e| PipelineError::StoreWrite(format!("failed to track {symbol}: {e}")),
            |tx| {
                tx.execute(
                    "INSERT OR IGNORE INTO coin (ticker) VALUES (?1)",
                    params![symbol.as_str()],
                )
            },
        )?;
        Ok(inserted > 0)
    }
}
