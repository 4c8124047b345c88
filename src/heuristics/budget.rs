//! Cooperative time budget.
//!
//! The search never gets interrupted: every nested loop polls a
//! [`Session`], which expires either when the global run clock gets within a
//! safety margin of the time limit or when the session itself has been
//! running longer than its own limit.

use std::time::{Duration, Instant};

/// Wall clock of a whole solver run
#[derive(Debug, Clone, Copy)]
pub struct SearchClock {
    start: Instant,
    time_limit: Duration,
}

impl SearchClock {
    pub fn start(time_limit: Duration) -> Self {
        SearchClock {
            start: Instant::now(),
            time_limit,
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// True once the elapsed time reaches `time_limit - margin`
    #[inline]
    pub fn reached(&self, margin: Duration) -> bool {
        self.elapsed() >= self.time_limit.saturating_sub(margin)
    }

    /// Open a session bounded by this clock and by its own `limit`
    pub fn session(&self, margin: Duration, limit: Duration) -> Session<'_> {
        Session {
            clock: self,
            margin,
            limit,
            started: Instant::now(),
        }
    }
}

/// Budget of a single operator invocation
#[derive(Debug, Clone, Copy)]
pub struct Session<'a> {
    clock: &'a SearchClock,
    margin: Duration,
    limit: Duration,
    started: Instant,
}

impl Session<'_> {
    #[inline]
    pub fn expired(&self) -> bool {
        self.clock.reached(self.margin) || self.started.elapsed() >= self.limit
    }
}
