//! Runtime configuration for the price ingestor.
//!
//! Settings are read from a TOML file (default [`DEFAULT_CONFIG_PATH`]). Every
//! field has a default, so a partial file or no file at all is valid. Two
//! environment variables override the file: `QUOTE_SERVICE_URL` and
//! `PRICE_DB_PATH`.
//!
//! ```toml
//! [quote_service]
//! base_url = "https://api.binance.com"
//! timeout_secs = 30
//!
//! [store]
//! path = "./data/prices.db"
//!
//! [job]
//! batch_size = 20
//! settlement_currency = "USDT"
//! ```
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use quote_common::batch::MAX_BATCH_SIZE;
use quote_common::{PipelineError, Result, SETTLEMENT_CURRENCY};
use serde::Deserialize;

/// Config file used when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "./configs/app.toml";
/// Environment variable overriding `quote_service.base_url`.
pub const ENV_QUOTE_SERVICE_URL: &str = "QUOTE_SERVICE_URL";
/// Environment variable overriding `store.path`.
pub const ENV_DB_PATH: &str = "PRICE_DB_PATH";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// External quote service.
    pub quote_service: QuoteServiceConfig,
    /// Price database.
    pub store: StoreConfig,
    /// Ingestion job.
    pub job: JobConfig,
}

/// `[quote_service]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuoteServiceConfig {
    /// Base URL of the batch price endpoint.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for QuoteServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl QuoteServiceConfig {
    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite database file.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/prices.db"),
        }
    }
}

/// `[job]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    /// Symbols per quote-service call, clamped to `1..=20`.
    pub batch_size: usize,
    /// Quote currency every symbol is priced in.
    pub settlement_currency: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            settlement_currency: SETTLEMENT_CURRENCY.to_string(),
        }
    }
}

impl Config {
    /// Loads `path`, falling back to defaults when the file does not exist,
    /// then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let config = match fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Parses a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;
        Ok(config.normalized())
    }

    /// Applies overrides looked up by environment variable name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_QUOTE_SERVICE_URL).filter(|v| !v.trim().is_empty()) {
            self.quote_service.base_url = url;
        }
        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.trim().is_empty()) {
            self.store.path = PathBuf::from(path);
        }
        self
    }

    fn normalized(mut self) -> Self {
        let clamped = self.job.batch_size.clamp(1, MAX_BATCH_SIZE);
        if clamped != self.job.batch_size {
            warn!(
                "job.batch_size {} out of range, using {}",
                self.job.batch_size, clamped
            );
            self.job.batch_size = clamped;
        }
        self.job.settlement_currency = self.job.settlement_currency.trim().to_ascii_uppercase();
        self
    }
}
