use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::utils::bucket::floor_bucket;

/// Decides whether an idle reading means the user worked in the current bucket.
pub struct ActivityEvaluator<Tz: TimeZone> {
    tz: Tz,
}

impl<Tz: TimeZone> ActivityEvaluator<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Working when the last input happened at or after the start of the bucket `now` falls
    /// into. Buckets are floored in the evaluator's time zone.
    pub fn is_working(&self, now: DateTime<Utc>, idle: Duration) -> bool {
        let Ok(idle) = chrono::Duration::from_std(idle) else {
            return false;
        };
        let bucket_start = floor_bucket(now.with_timezone(&self.tz)).to_utc();
        now.checked_sub_signed(idle)
            .is_some_and(|v| v >= bucket_start)
    }
}
