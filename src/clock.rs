//! Time source for cache timestamps
//!
//! Cache entries are stamped with epoch milliseconds. The clock is injected so
//! tests can step across the expiry boundary without sleeping.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// A source of the current time in epoch milliseconds
pub trait Clock: Send + Sync {
    /// Returns the current time as milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// Wall-clock time from the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Creates a clock frozen at `now` milliseconds
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Moves the clock forward by `millis`
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
