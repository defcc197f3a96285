use chrono::{DateTime, Duration, TimeZone};

use crate::{store::Store, utils::bucket::BUCKET_WIDTH, utils::time::day_start};

use super::resolver::{resolve, ResolvedWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FocusStats {
    /// Longest unbroken run of working buckets.
    pub longest_focus: Duration,
    /// Status changes between neighbouring buckets.
    pub context_switches: u32,
}

pub fn focus_stats_of(resolved: &ResolvedWindow) -> FocusStats {
    let mut stats = FocusStats::default();
    let mut current = Duration::zero();
    let mut previous = None;

    for status in resolved.statuses() {
        if status.is_working() {
            current += BUCKET_WIDTH;
            stats.longest_focus = stats.longest_focus.max(current);
        } else {
            current = Duration::zero();
        }
        if previous.is_some_and(|v| v != status) {
            stats.context_switches += 1;
        }
        previous = Some(status);
    }

    stats
}

/// Focus statistics of today so far.
pub fn focus_stats<Tz: TimeZone>(store: &Store, now: &DateTime<Tz>) -> FocusStats {
    focus_stats_of(&resolve(store, &day_start(now), now))
}
