//! Hourly price-ingestion job.
//!
//! The job is a small state machine running on its own thread:
//!
//! - `Idle` — constructed, not started.
//! - `Waiting { until }` — one timer armed for the next full hour.
//! - `Running` — one cycle executing.
//! - `Terminated` — cancellation observed.
//!
//! Cancellation is cooperative. It is observed while waiting for the timer and
//! between cycles, never inside a cycle: a cycle in flight (including a
//! rate-limit sleep and its retry) runs to completion or failure first.
//!
//! A cycle lists the tracked symbols, splits them into batches and, batch by
//! batch, fetches prices and persists one observation per returned pair. The
//! first error abandons the rest of the cycle; observations already written stay.
//! The next attempt is the next hourly trigger.
use crossbeam_channel::{Receiver, Sender, TryRecvError, after, select};
use log::{debug, error, info, warn};
use quote_client::QuoteSource;
use quote_common::batch::{MAX_BATCH_SIZE, partition};
use quote_common::{PipelineError, PriceObservation, QuotePair, Result, SETTLEMENT_CURRENCY};
use strum_macros::Display;

use chrono::{DateTime, Utc};

use crate::schedule::{Clock, SystemClock, next_trigger, time_until};
use crate::store::PriceStore;

/// Lifecycle state of the ingestion job.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum JobState {
    /// Not started yet.
    Idle,
    /// Timer armed for `until`.
    Waiting {
        /// Next trigger time.
        until: DateTime<Utc>,
    },
    /// A cycle is executing.
    Running,
    /// Cancellation observed; the loop has exited.
    Terminated,
}

/// Per-job settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    /// Symbols per quote-service call.
    pub batch_size: usize,
    /// Quote currency of stored observations.
    pub quote_currency: String,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            quote_currency: SETTLEMENT_CURRENCY.to_string(),
        }
    }
}

/// Outcome of a successful cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Tracked symbols listed from the catalog.
    pub symbols: usize,
    /// Batches fetched from the quote service.
    pub batches: usize,
    /// New observations written.
    pub observations: usize,
}

/// Totals of one `run` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles started.
    pub cycles: u64,
    /// Cycles that ended with an error.
    pub failed: u64,
}

/// Scheduler and orchestrator of the hourly ingestion.
pub struct IngestionJob<Q, S, C = SystemClock> {
    source: Q,
    store: S,
    clock: C,
    settings: JobSettings,
    state: JobState,
    events: Option<Sender<JobState>>,
}

impl<Q: QuoteSource, S: PriceStore> IngestionJob<Q, S> {
    /// Creates a job driven by the system clock.
    pub fn new(source: Q, store: S, settings: JobSettings) -> Self {
        Self::with_clock(source, store, SystemClock, settings)
    }
}

impl<Q: QuoteSource, S: PriceStore, C: Clock> IngestionJob<Q, S, C> {
    /// Creates a job with a custom clock.
    pub fn with_clock(source: Q, store: S, clock: C, settings: JobSettings) -> Self {
        Self {
            source,
            store,
            clock,
            settings,
            state: JobState::Idle,
            events: None,
        }
    }

    /// Publishes every state transition on `events`.
    pub fn with_state_events(mut self, events: Sender<JobState>) -> Self {
        self.events = Some(events);
        self
    }

    /// Current state.
    pub fn state(&self) -> &JobState {
        &self.state
    }

    fn transition(&mut self, next: JobState) {
        debug!("Job state {} -> {}", self.state, next);
        self.state = next;
        if let Some(events) = &self.events {
            // A dropped listener must not stop ingestion.
            let _ = events.send(self.state.clone());
        }
    }

    fn arm_timer(&mut self) {
        let until = next_trigger(self.clock.now());
        info!("Next hourly job scheduled at {}", until);
        self.transition(JobState::Waiting { until });
    }

    /// Runs the schedule until `cancel` fires or is disconnected.
    pub fn run(&mut self, cancel: &Receiver<()>) -> RunSummary {
        let mut summary = RunSummary::default();

        loop {
            match self.state.clone() {
                JobState::Idle => self.arm_timer(),
                JobState::Waiting { until } => {
                    let wait = time_until(self.clock.now(), until);
                    select! {
                        recv(cancel) -> _ => self.transition(JobState::Terminated),
                        recv(after(wait)) -> _ => self.transition(JobState::Running),
                    }
                }
                JobState::Running => {
                    summary.cycles += 1;
                    info!("Hourly job started");
                    match self.run_cycle() {
                        Ok(report) => info!(
                            "Hourly job stopped: {} symbols, {} batches, {} observations",
                            report.symbols, report.batches, report.observations
                        ),
                        Err(e) => {
                            summary.failed += 1;
                            error!("Failed to update hourly price ({}): {}", e.kind(), e);
                        }
                    }
                    if cancel_requested(cancel) {
                        self.transition(JobState::Terminated);
                    } else {
                        self.arm_timer();
                    }
                }
                JobState::Terminated => break,
            }
        }
        info!(
            "Hourly job terminated after {} cycles ({} failed)",
            summary.cycles, summary.failed
        );
        summary
    }

    /// Executes one ingestion cycle now.
    pub fn run_cycle(&self) -> Result<CycleReport> {
        let symbols = self.store.tracked_symbols().map_err(|e| match e {
            PipelineError::CatalogRead(_) => e,
            other => PipelineError::CatalogRead(other.to_string()),
        })?;

        let mut report = CycleReport {
            symbols: symbols.len(),
            ..CycleReport::default()
        };
        for batch in partition(&symbols, self.settings.batch_size) {
            let pairs = self.source.fetch_batch(batch).inspect_err(|e| {
                error!(
                    "Failed to retrieve batch {:?}, abandoning cycle after {} batches: {}",
                    batch, report.batches, e
                );
            })?;
            report.batches += 1;
            debug!("Batch of prices retrieved: {}", pairs.len());

            for pair in &pairs {
                if self.persist(pair)? {
                    report.observations += 1;
                }
            }
        }
        if report.observations < report.symbols {
            warn!(
                "Quote service returned prices for {} of {} symbols",
                report.observations, report.symbols
            );
        }
        Ok(report)
    }

    fn persist(&self, pair: &QuotePair) -> Result<bool> {
        let obs = PriceObservation::from_pair(pair, &self.settings.quote_currency, self.clock.now())
            .inspect_err(|e| error!("Failed to convert price to decimal: {}", e))?;
        debug!("Inserting hourly price {} {}", obs.base_symbol, obs.price);

        self.store
            .upsert_price_observation(&obs)
            .map_err(|e| match e {
                PipelineError::StoreWrite(_) => e,
                other => PipelineError::StoreWrite(other.to_string()),
            })
            .inspect_err(|e| error!("Failed to insert hourly price: {}", e))
    }
}

fn cancel_requested(cancel: &Receiver<()>) -> bool {
    match cancel.try_recv() {
        Ok(()) | Err(TryRecvError::Disconnected) => true,
        Err(TryRecvError::Empty) => false,
    }
}
