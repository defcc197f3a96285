//! Fixed-width time buckets. Every sample and range in the store is aligned to this grid.
//!
//! Buckets are aligned in civil time of whatever timezone the instant carries, which lets the
//! daemon use [chrono::Local] while tests pin everything to [chrono::Utc].

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};

pub const BUCKET_MINUTES: u32 = 5;

pub const BUCKET_WIDTH: Duration = Duration::minutes(BUCKET_MINUTES as i64);

/// Start of the bucket containing `t`. Truncates to the minute, then rounds the minute down to a
/// multiple of [BUCKET_MINUTES].
pub fn floor_bucket<Tz: TimeZone>(t: DateTime<Tz>) -> DateTime<Tz> {
    let excess = Duration::minutes((t.minute() % BUCKET_MINUTES) as i64)
        + Duration::seconds(t.second() as i64)
        + Duration::nanoseconds(t.nanosecond() as i64);
    t - excess
}

/// Start of the bucket after the one containing `t`.
pub fn next_bucket<Tz: TimeZone>(t: DateTime<Tz>) -> DateTime<Tz> {
    floor_bucket(t) + BUCKET_WIDTH
}

/// Smallest bucket boundary that is not before `t`.
pub fn ceil_bucket<Tz: TimeZone>(t: DateTime<Tz>) -> DateTime<Tz> {
    let floor = floor_bucket(t.clone());
    if floor == t {
        floor
    } else {
        floor + BUCKET_WIDTH
    }
}

pub fn is_aligned<Tz: TimeZone>(t: &DateTime<Tz>) -> bool {
    floor_bucket(t.clone()) == *t
}

/// Iterates bucket starts of the grid `[floor(start), floor(end))`.
pub fn bucket_grid<Tz: TimeZone>(
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
) -> impl Iterator<Item = DateTime<Utc>> {
    let first = floor_bucket(start.clone()).to_utc();
    let last = floor_bucket(end.clone()).to_utc();
    std::iter::successors(Some(first), |v| Some(*v + BUCKET_WIDTH)).take_while(move |v| *v < last)
}
