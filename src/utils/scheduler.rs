//! Periodic tick sources.
//!
//! A [`Scheduler`] decides *when* interpolation ticks are due; it never runs
//! them. The owner feeds elapsed time through [`Scheduler::advance`] (from a
//! render loop, a test, or a real timer) and runs one update per returned
//! tick. Nothing here spawns threads.

use std::fmt;
use std::time::Duration;

/// Most ticks reported by a single [`IntervalScheduler::advance`] call.
/// Longer stalls drop the extra ticks.
pub const MAX_CATCH_UP_TICKS: u32 = 16;

/// Source of periodic ticks.
pub trait Scheduler: fmt::Debug {
    /// Fires every `period` until stopped.
    fn run(&mut self, period: Duration);

    /// Fires once, `delay` from now.
    fn run_once(&mut self, delay: Duration);

    fn stop(&mut self);

    fn is_active(&self) -> bool;

    /// Advances the scheduler clock by `dt` and returns how many ticks
    /// became due.
    fn advance(&mut self, dt: Duration) -> u32;
}

/// Fixed-period scheduler driven by elapsed time.
#[derive(Debug, Clone, Default)]
pub struct IntervalScheduler {
    period: Duration,
    accumulated: Duration,
    active: bool,
    one_shot: bool,
    /// Total number of ticks fired
    pub tick_count: u64,
}

impl IntervalScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    fn arm(&mut self, period: Duration, one_shot: bool) {
        self.period = period;
        self.accumulated = Duration::ZERO;
        self.active = true;
        self.one_shot = one_shot;
    }
}

impl Scheduler for IntervalScheduler {
    fn run(&mut self, period: Duration) {
        self.arm(period, false);
    }

    fn run_once(&mut self, delay: Duration) {
        self.arm(delay, true);
    }

    fn stop(&mut self) {
        self.active = false;
        self.accumulated = Duration::ZERO;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn advance(&mut self, dt: Duration) -> u32 {
        if !self.active {
            return 0;
        }

        self.accumulated += dt;

        if self.period.is_zero() {
            self.accumulated = Duration::ZERO;
            self.tick_count += 1;
            if self.one_shot {
                self.active = false;
            }
            return 1;
        }

        if self.accumulated < self.period {
            return 0;
        }

        if self.one_shot {
            self.stop();
            self.tick_count += 1;
            return 1;
        }

        let due = self.accumulated.as_nanos() / self.period.as_nanos();
        let remainder = self.accumulated.as_nanos() % self.period.as_nanos();
        // `remainder` is below `period`, which fits in a Duration.
        self.accumulated = Duration::from_nanos(u64::try_from(remainder).unwrap_or(0));

        let fired = u32::try_from(due).unwrap_or(u32::MAX).min(MAX_CATCH_UP_TICKS);
        if u128::from(fired) < due {
            log::debug!("Scheduler dropped {} late tick(s)", due - u128::from(fired));
        }
        self.tick_count += u64::from(fired);
        fired
    }
}
