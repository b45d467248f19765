//! Time source used by the container URL cache.

use crate::Timestamp;
use chrono::{Duration, Utc};
use std::sync::{RwLock, RwLockWriteGuard};

/// Source of the current time.
/// Implementations must be thread-safe (Send + Sync).
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Timestamp> {
        match self.now.write() {
            Ok(now) => now,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, instant: Timestamp) {
        *self.write() = instant;
    }

    /// Move the clock forward (or backward for a negative delta).
    pub fn advance(&self, delta: Duration) {
        *self.write() += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        match self.now.read() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
