#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use crossbeam_channel::Sender;
use price_ingestor::schedule::Clock;
use quote_client::QuoteSource;
use quote_common::{PipelineError, QuotePair, Result, Symbol};

/// Clock whose time only moves when a test sets it.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Side effect a scripted call performs before answering.
pub enum Effect {
    None,
    Cancel(Sender<()>),
    SetClock(ManualClock, DateTime<Utc>),
}

/// Quote source answering batch calls from a script.
pub struct ScriptedSource {
    replies: Mutex<VecDeque<(Effect, Result<Vec<QuotePair>>)>>,
    pub requests: Mutex<Vec<Vec<String>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, pairs: &[(&str, &str)]) -> Self {
        self.reply_with(Effect::None, Ok(pairs_of(pairs)))
    }

    pub fn fail(self, err: PipelineError) -> Self {
        self.reply_with(Effect::None, Err(err))
    }

    pub fn reply_with(self, effect: Effect, reply: Result<Vec<QuotePair>>) -> Self {
        self.replies.lock().unwrap().push_back((effect, reply));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl QuoteSource for ScriptedSource {
    fn fetch_batch(&self, batch: &[Symbol]) -> Result<Vec<QuotePair>> {
        self.requests
            .lock()
            .unwrap()
            .push(batch.iter().map(|s| s.to_string()).collect());
        let (effect, reply) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| (Effect::None, Ok(Vec::new())));
        match effect {
            Effect::None => {}
            Effect::Cancel(tx) => tx.send(()).unwrap(),
            Effect::SetClock(clock, now) => clock.set(now),
        }
        reply
    }

    fn fetch_last_price(&self, symbol: &Symbol) -> Result<QuotePair> {
        Err(PipelineError::NotFound(symbol.to_string()))
    }
}

pub fn pairs_of(pairs: &[(&str, &str)]) -> Vec<QuotePair> {
    pairs.iter().map(|(s, p)| QuotePair::new(*s, *p)).collect()
}

pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
}
