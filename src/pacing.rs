//! Keeping a minimum gap between consecutive requests.

use std::thread;
use std::time::{Duration, Instant};

/// The default minimum gap between two archive downloads.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// A source of time which can also block the current thread.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// The real wall clock.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Tracks when the last request was dispatched and makes sure the next one
/// doesn't go out until `min_interval` has passed.
///
/// The clock starts running when the `Pacer` is created, so even the very
/// first request may have to wait.
#[derive(Debug, Clone)]
pub struct Pacer<C> {
    clock: C,
    min_interval: Duration,
    last_dispatch: Instant,
}

impl<C: Clock> Pacer<C> {
    pub fn new(clock: C, min_interval: Duration) -> Pacer<C> {
        let last_dispatch = clock.now();

        Pacer {
            clock,
            min_interval,
            last_dispatch,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// How much longer we'd need to wait before dispatching, if at all.
    pub fn remaining(&self) -> Option<Duration> {
        let elapsed = self
            .clock
            .now()
            .saturating_duration_since(self.last_dispatch);

        if elapsed < self.min_interval {
            Some(self.min_interval - elapsed)
        } else {
            None
        }
    }

    /// Block until the next request is allowed, then restart the clock.
    ///
    /// Returns how long we slept for.
    pub fn pace(&mut self) -> Duration {
        let slept = match self.remaining() {
            Some(delay) => {
                warn!("Sleeping for: {}", delay.as_secs_f64());
                self.clock.sleep(delay);
                delay
            }
            None => Duration::from_secs(0),
        };

        self.mark();
        slept
    }

    /// Restart the clock without waiting.
    pub fn mark(&mut self) {
        self.last_dispatch = self.clock.now();
    }
}
