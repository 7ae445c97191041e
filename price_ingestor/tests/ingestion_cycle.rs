//! One ingestion cycle against an in-memory SQLite store.
mod common;

use std::sync::Mutex;

use common::{ManualClock, ScriptedSource, at};
use price_ingestor::{IngestionJob, JobSettings, PriceStore, SqliteStore};
use quote_common::{ErrorKind, PipelineError, PriceObservation, Result, Symbol};

fn store_tracking(names: &[&str]) -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    for name in names {
        store.track_symbol(&name.parse().unwrap()).unwrap();
    }
    store
}

fn latest(store: &SqliteStore, name: &str) -> Option<String> {
    store
        .latest_price(&name.parse().unwrap())
        .ok()
        .map(|obs| obs.price.to_string())
}

fn batches_of(batch_size: usize) -> JobSettings {
    JobSettings {
        batch_size,
        ..JobSettings::default()
    }
}

#[test]
fn partial_upstream_result_is_not_an_error() {
    let store = store_tracking(&["BTC", "ETH", "DOGE"]);
    let source = ScriptedSource::new().reply(&[("BTCUSDT", "50000.00"), ("ETHUSDT", "3000.00")]);
    let job = IngestionJob::with_clock(
        &source,
        &store,
        ManualClock::at(at(15, 0, 0)),
        JobSettings::default(),
    );

    let report = job.run_cycle().unwrap();

    assert_eq!(report.symbols, 3);
    assert_eq!(report.batches, 1);
    assert_eq!(report.observations, 2);
    assert_eq!(latest(&store, "BTC").as_deref(), Some("50000.00"));
    assert_eq!(latest(&store, "ETH").as_deref(), Some("3000.00"));
    assert_eq!(latest(&store, "DOGE"), None);
    // Catalog order is ascending.
    assert_eq!(source.requests.lock().unwrap()[0], ["BTC", "DOGE", "ETH"]);
}

#[test]
fn observation_is_truncated_and_stamped_with_conversion_time() {
    let store = store_tracking(&["BTC"]);
    let source = ScriptedSource::new().reply(&[("BTCUSDT", "123.123456789")]);
    let job = IngestionJob::with_clock(
        &source,
        &store,
        ManualClock::at(at(15, 0, 3)),
        JobSettings::default(),
    );

    job.run_cycle().unwrap();

    let obs = store.latest_price(&"BTC".parse().unwrap()).unwrap();
    assert_eq!(
        obs,
        PriceObservation {
            base_symbol: "BTC".into(),
            quote_symbol: "USDT".into(),
            price: "123.12345678".parse().unwrap(),
            observed_at: at(15, 0, 3),
        }
    );
}

#[test]
fn failed_second_batch_keeps_first_batch() {
    let names = ["AA", "BB", "CC", "DD"];
    let store = store_tracking(&names);
    let source = ScriptedSource::new()
        .reply(&[("AAUSDT", "1.5"), ("BBUSDT", "2.5")])
        .fail(PipelineError::Network("connection reset".into()));
    let settings = batches_of(2);
    let job = IngestionJob::with_clock(&source, &store, ManualClock::at(at(15, 0, 0)), settings);

    let err = job.run_cycle().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(source.calls(), 2);
    assert_eq!(latest(&store, "AA").as_deref(), Some("1.5"));
    assert_eq!(latest(&store, "BB").as_deref(), Some("2.5"));
    assert_eq!(latest(&store, "CC"), None);
    assert_eq!(latest(&store, "DD"), None);
}

#[test]
fn batch_failure_stops_remaining_batches() {
    let names: Vec<String> = (0..45u8)
        .map(|i| String::from_utf8(vec![b'A' + i / 26, b'A' + i % 26]).unwrap())
        .collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let store = store_tracking(&refs);
    let source = ScriptedSource::new().fail(PipelineError::RateLimitExhausted("429 twice".into()));
    let job = IngestionJob::with_clock(
        &source,
        &store,
        ManualClock::at(at(15, 0, 0)),
        JobSettings::default(),
    );

    let err = job.run_cycle().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RateLimitExhausted);
    assert_eq!(source.calls(), 1);
    assert_eq!(source.requests.lock().unwrap()[0].len(), 20);
}

#[test]
fn malformed_price_aborts_remaining_conversions() {
    let store = store_tracking(&["BTC", "DOGE", "ETH"]);
    let source = ScriptedSource::new().reply(&[
        ("BTCUSDT", "50000.00"),
        ("DOGEUSDT", "not-a-price"),
        ("ETHUSDT", "3000.00"),
    ]);
    let job = IngestionJob::with_clock(
        &source,
        &store,
        ManualClock::at(at(15, 0, 0)),
        JobSettings::default(),
    );

    let err = job.run_cycle().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conversion);
    assert!(latest(&store, "BTC").is_some());
    assert_eq!(latest(&store, "ETH"), None);
}

/// SQLite store that rejects the nth observation write.
struct FailingWrite {
    inner: SqliteStore,
    fail_on: usize,
    attempts: Mutex<usize>,
}

impl FailingWrite {
    fn new(inner: SqliteStore, fail_on: usize) -> Self {
        Self {
            inner,
            fail_on,
            attempts: Mutex::new(0),
        }
    }

    fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

impl PriceStore for FailingWrite {
    fn upsert_price_observation(&self, obs: &PriceObservation) -> Result<bool> {
        let mut attempts = self.attempts.lock().unwrap();
        *attempts += 1;
        if *attempts == self.fail_on {
            return Err(PipelineError::Store("database is locked".into()));
        }
        drop(attempts);
        self.inner.upsert_price_observation(obs)
    }

    fn tracked_symbols(&self) -> Result<Vec<Symbol>> {
        self.inner.tracked_symbols()
    }

    fn latest_price(&self, symbol: &Symbol) -> Result<PriceObservation> {
        self.inner.latest_price(symbol)
    }

    fn track_symbol(&self, symbol: &Symbol) -> Result<bool> {
        self.inner.track_symbol(symbol)
    }
}

#[test]
fn store_write_failure_aborts_cycle() {
    let store = FailingWrite::new(store_tracking(&["AA", "BB", "CC", "DD", "EE", "FF"]), 2);
    let source = ScriptedSource::new()
        .reply(&[("AAUSDT", "1.5"), ("BBUSDT", "2.5"), ("CCUSDT", "3.5")])
        .reply(&[("DDUSDT", "4.5"), ("EEUSDT", "5.5"), ("FFUSDT", "6.5")]);
    let settings = batches_of(3);
    let job = IngestionJob::with_clock(&source, &store, ManualClock::at(at(15, 0, 0)), settings);

    let err = job.run_cycle().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StoreWrite);
    assert!(err.to_string().contains("database is locked"));
    // The third pair of the batch is never written and the next batch is never fetched.
    assert_eq!(store.attempts(), 2);
    assert_eq!(source.calls(), 1);
    assert_eq!(latest(&store.inner, "AA").as_deref(), Some("1.5"));
    assert_eq!(latest(&store.inner, "BB"), None);
    assert_eq!(latest(&store.inner, "CC"), None);
    assert_eq!(latest(&store.inner, "DD"), None);
}

#[test]
fn rerunning_the_same_instant_writes_nothing_new() {
    let store = store_tracking(&["BTC"]);
    let source = ScriptedSource::new()
        .reply(&[("BTCUSDT", "1.0")])
        .reply(&[("BTCUSDT", "2.0")]);
    let job = IngestionJob::with_clock(
        &source,
        &store,
        ManualClock::at(at(15, 0, 0)),
        JobSettings::default(),
    );

    assert_eq!(job.run_cycle().unwrap().observations, 1);
    assert_eq!(job.run_cycle().unwrap().observations, 0);
    assert_eq!(latest(&store, "BTC").as_deref(), Some("1.0"));
}

#[test]
fn empty_catalog_makes_no_calls() {
    let store = store_tracking(&[]);
    let source = ScriptedSource::new();
    let job = IngestionJob::with_clock(
        &source,
        &store,
        ManualClock::at(at(15, 0, 0)),
        JobSettings::default(),
    );

    assert_eq!(job.run_cycle().unwrap().batches, 0);
    assert_eq!(source.calls(), 0);
}

struct BrokenCatalog;

impl PriceStore for BrokenCatalog {
    fn upsert_price_observation(&self, _obs: &PriceObservation) -> Result<bool> {
        Err(PipelineError::Format("disk full".into()))
    }

    fn tracked_symbols(&self) -> Result<Vec<Symbol>> {
        Err(PipelineError::Format("connection refused".into()))
    }

    fn latest_price(&self, symbol: &Symbol) -> Result<PriceObservation> {
        Err(PipelineError::NotFound(symbol.to_string()))
    }

    fn track_symbol(&self, _symbol: &Symbol) -> Result<bool> {
        Ok(false)
    }
}

#[test]
fn catalog_failure_is_catalog_read_error() {
    let source = ScriptedSource::new();
    let job = IngestionJob::with_clock(
        &source,
        BrokenCatalog,
        ManualClock::at(at(15, 0, 0)),
        JobSettings::default(),
    );

    let err = job.run_cycle().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CatalogRead);
    assert_eq!(source.calls(), 0);
}
