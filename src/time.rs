use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::model::Timestamp;

/// An interval whose ticks fall on wall-clock multiples of `period`, so that
/// every instance of the service flushes at the same moments.
pub fn timer(period: Duration) -> Interval {
    let start = Instant::now() + duration_to_next_instant(period, Utc::now());

    let mut timer = tokio::time::interval_at(start, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer
}

/// compute the time until the next multiple of `period` since the unix epoch.
fn duration_to_next_instant(period: Duration, now: Timestamp) -> Duration {
    let period = i64::try_from(period.as_millis()).unwrap_or(i64::MAX).max(1);
    let elapsed = now.timestamp_millis().rem_euclid(period);

    Duration::from_millis(u64::try_from(period - elapsed).unwrap_or_default())
}
