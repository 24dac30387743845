//! Fixed-interval accumulators driving the periodic jobs.

use std::time::Duration;

/// Fires once per elapsed interval.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval: Duration,
    accumulated: Duration,
    suspended: bool,
}

impl IntervalTimer {
    /// Creates a timer with the given interval in milliseconds.
    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Creates a timer with the given interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            accumulated: Duration::ZERO,
            suspended: false,
        }
    }

    /// Adds elapsed time. Returns true when the job should run.
    ///
    /// Fires at most once per call. If the caller fell more than two
    /// intervals behind, the backlog is dropped instead of replayed.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.suspended {
            return false;
        }

        self.accumulated += dt;
        if self.accumulated < self.interval {
            return false;
        }

        self.accumulated -= self.interval;
        if self.accumulated > self.interval * 2 {
            self.accumulated = Duration::ZERO;
        }
        true
    }

    /// Current interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Changes the interval and clears the backlog.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(Duration::from_millis(1));
        self.accumulated = Duration::ZERO;
    }

    /// Clears accumulated time.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }

    /// Stops the timer from firing until resumed.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Resumes a suspended timer with a clean backlog.
    pub fn resume(&mut self) {
        self.suspended = false;
        self.accumulated = Duration::ZERO;
    }

    /// Whether the timer is suspended.
    #[must_use]
    pub const fn is_suspended(&self) -> bool {
        self.suspended
    }
}
