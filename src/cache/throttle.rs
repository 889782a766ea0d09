//! Throttle Module
//!
//! Drops calls that arrive too soon after the last executed one.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

// == Throttle ==
/// Rate limiter for a maintenance action.
///
/// A call runs only when more than `interval` has passed since the last call
/// that ran; otherwise it is discarded, never queued. The window starts at
/// construction, so the first call inside `interval` is dropped too.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last_run: Mutex<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: Mutex::new(Instant::now()),
        }
    }

    // == Try Acquire ==
    /// Returns `true` and restarts the window if a call may run now.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut last = self.last_run.lock();
        if now.duration_since(*last) > self.interval {
            *last = now;
            true
        } else {
            false
        }
    }

    // == Call ==
    /// Runs `action` unless throttled. Returns whether it ran.
    pub fn call<F: FnOnce()>(&self, action: F) -> bool {
        let acquired = self.try_acquire();
        if acquired {
            action();
        }
        acquired
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
