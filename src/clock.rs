//! Wall clock and round window evaluation

use crate::types::{Phase, RoundConfiguration, TimeOfDay};
use chrono::{NaiveDateTime, NaiveTime, Timelike};
use std::sync::Mutex;

/// Source of the current local wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local time of the host machine
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Manually driven clock for tests and tooling
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Map a time of day onto the half-open submission window [open, close)
pub fn evaluate_phase(now: NaiveTime, open: TimeOfDay, close: TimeOfDay) -> Phase {
    // Minute precision, same as comparing "HH:MM" strings
    let now = now
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);

    if now >= close.as_naive() {
        Phase::ClosedAfter
    } else if now >= open.as_naive() {
        Phase::Open
    } else {
        Phase::ClosedBefore
    }
}

impl RoundConfiguration {
    pub fn phase_at(&self, now: NaiveTime) -> Phase {
        evaluate_phase(now, self.open_time, self.close_time)
    }
}
