//! Wall-clock trigger computation for the hourly ingestion cycle.
//!
//! The next trigger is always the start of the next full UTC hour after "now".
//! It is recomputed from the current time after every cycle, so a cycle that
//! overruns an hour boundary does not queue a catch-up run.
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// Source of the current time.
pub trait Clock {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock reading the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Start of the hour following `now`.
pub fn next_trigger(now: DateTime<Utc>) -> DateTime<Utc> {
    let hour = TimeDelta::hours(1);
    // Truncation only fails outside chrono's nanosecond timestamp range.
    let start_of_hour = now.duration_trunc(hour).unwrap_or(now);
    start_of_hour + hour
}

/// Time left from `now` until `until`, zero if already passed.
pub fn time_until(now: DateTime<Utc>, until: DateTime<Utc>) -> Duration {
    (until - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn next_trigger_is_next_full_hour() {
        assert_eq!(next_trigger(at(14, 23, 10)), at(15, 0, 0));
        assert_eq!(next_trigger(at(14, 59, 59)), at(15, 0, 0));
    }

    #[test]
    fn exactly_on_the_hour_waits_a_full_hour() {
        assert_eq!(next_trigger(at(15, 0, 0)), at(16, 0, 0));
    }

    #[test]
    fn overrun_cycle_does_not_catch_up() {
        // Cycle started at 15:00 and finished at 15:05.
        assert_eq!(next_trigger(at(15, 5, 0)), at(16, 0, 0));
    }

    #[test]
    fn rolls_over_midnight() {
        let late = Utc.with_ymd_and_hms(2024, 12, 31, 23, 30, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(next_trigger(late), expected);
    }

    #[test]
    fn time_until_never_negative() {
        assert_eq!(time_until(at(14, 23, 10), at(15, 0, 0)), Duration::from_secs(36 * 60 + 50));
        assert_eq!(time_until(at(15, 0, 1), at(15, 0, 0)), Duration::ZERO);
    }
}
