//! Injectable clock.
//!
//! Every time read in the gateway — `Last-Modified` stamping, signature
//! expiry, clock-skew checks, multipart timestamps — goes through a
//! [`TimeSource`] so tests can freeze the clock.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// A source of the current time.
pub trait TimeSource: Send + Sync {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The default time source, backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A time source frozen at a fixed instant, advanceable by tests.
#[derive(Debug)]
pub struct FixedTimeSource {
    now: Mutex<DateTime<Utc>>,
}

impl FixedTimeSource {
    /// Create a time source frozen at `at`.
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(at),
        }
    }

    /// Advance the frozen clock by `duration`.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut now = self.now.lock().expect("time source lock poisoned");
        *now += duration;
    }

    /// Set the frozen clock to `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        let mut now = self.now.lock().expect("time source lock poisoned");
        *now = at;
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("time source lock poisoned")
    }
}
