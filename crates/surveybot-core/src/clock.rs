//! Monotonic time source and the repeating tick used by the sweeper.

use std::time::{Duration, Instant};

use tokio::time::{Interval, MissedTickBehavior};

/// Supplies the current monotonic time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Clock backed by `tokio::time`, so tests running on a paused runtime see
/// virtual time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// A repeating tick that does not burst to catch up after a slow tick.
///
/// The first tick fires one full `period` after creation.
pub fn ticker(period: Duration) -> Interval {
    let start = tokio::time::Instant::now() + period;
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
