use std::{collections::BTreeMap, fmt::Display};

use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::ValueEnum;

use crate::{
    store::Store,
    utils::{
        bucket::BUCKET_WIDTH,
        time::{day_start, month_start, next_day_start, next_month_start},
    },
};

use super::periods::Period;

/// Label working time without a tag is reported under.
pub const UNTAGGED: &str = "(untagged)";

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TagPeriod {
    Day,
    Week,
    Month,
}

impl Display for TagPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagPeriod::Day => write!(f, "day"),
            TagPeriod::Week => write!(f, "week"),
            TagPeriod::Month => write!(f, "month"),
        }
    }
}

impl TagPeriod {
    pub fn bounds<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            TagPeriod::Day => (day_start(now).to_utc(), next_day_start(now).to_utc()),
            TagPeriod::Week => {
                let (start, end) = Period::Week.bounds(now);
                (start.to_utc(), end.to_utc())
            }
            TagPeriod::Month => (month_start(now).to_utc(), next_month_start(now).to_utc()),
        }
    }
}

/// Working time per tag in the period containing `now`.
pub fn tag_hours<Tz: TimeZone>(
    store: &Store,
    period: TagPeriod,
    now: &DateTime<Tz>,
) -> BTreeMap<String, Duration> {
    let (start, end) = period.bounds(now);
    tag_time_between(store, start, end)
}

/// Working ranges are clipped to `[start, end)` and counted under their tag. Every range is
/// counted on its own, so overlapping ranges each contribute. Working raw samples that no range
/// covers count as untagged.
pub fn tag_time_between(
    store: &Store,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> BTreeMap<String, Duration> {
    let mut tags = BTreeMap::<String, Duration>::new();
    let mut untagged = Duration::zero();

    for range in store.ranges().iter().filter(|v| v.status.is_working()) {
        let Some((from, to)) = range.clamp(start, end) else {
            continue;
        };
        match &range.tag {
            Some(tag) => *tags.entry(tag.clone()).or_insert_with(Duration::zero) += to - from,
            None => untagged += to - from,
        }
    }

    for (bucket, status) in store.samples().range(start..end) {
        if status.is_working() && store.range_at(*bucket).is_none() {
            untagged += BUCKET_WIDTH;
        }
    }

    if untagged > Duration::zero() {
        tags.insert(UNTAGGED.to_string(), untagged);
    }
    tags
}

/// Tags in display order: alphabetical, with [UNTAGGED] last.
pub fn ordered_tags<'a>(
    maps: impl IntoIterator<Item = &'a BTreeMap<String, Duration>>,
) -> Vec<String> {
    let mut has_untagged = false;
    let mut tags = maps
        .into_iter()
        .flat_map(|v| v.keys())
        .filter(|v| {
            has_untagged |= v.as_str() == UNTAGGED;
            v.as_str() != UNTAGGED
        })
        .cloned()
        .collect::<Vec<_>>();
    tags.sort();
    tags.dedup();
    if has_untagged {
        tags.push(UNTAGGED.to_string());
    }
    tags
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use crate::{
        query::resolver::resolve_sparse,
        store::{compactor::Compactor, Range, Status, Store},
    };

    use super::{ordered_tags, tag_hours, tag_time_between, TagPeriod, UNTAGGED};

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(), NaiveTime::MIN);

    fn minute(m: i64) -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START_DATE) + Duration::minutes(m)
    }

    #[test]
    fn test_tag_is_clipped_to_window() {
        let mut store = Store::default();
        store.append_range(
            Range::aligned(minute(9 * 60), minute(11 * 60), Status::Working).with_tag("client"),
        );

        let tags = tag_time_between(&store, minute(10 * 60), minute(10 * 60 + 30));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags["client"], Duration::minutes(30));
    }

    #[test]
    fn test_untagged_ranges_and_uncovered_samples() {
        let mut store = Store::default();
        store.append_range(Range::aligned(minute(0), minute(60), Status::Working));
        store.append_range(Range::aligned(minute(60), minute(90), Status::Idle));
        store.append_range(
            Range::aligned(minute(90), minute(120), Status::Working).with_tag("ops"),
        );
        // covered by the idle range, not counted
        store.upsert_sample(minute(70), true);
        store.upsert_sample(minute(200), true);
        store.upsert_sample(minute(205), false);

        let tags = tag_hours(&store, TagPeriod::Day, &minute(300));
        assert_eq!(tags[UNTAGGED], Duration::minutes(65));
        assert_eq!(tags["ops"], Duration::minutes(30));
    }

    #[test]
    fn test_overlapping_ranges_count_independently() {
        let mut store = Store::default();
        store.append_range(Range::aligned(minute(0), minute(60), Status::Working).with_tag("a"));
        store.append_range(Range::aligned(minute(30), minute(60), Status::Working).with_tag("b"));

        let tags = tag_time_between(&store, minute(0), minute(24 * 60));
        assert_eq!(tags["a"], Duration::minutes(60));
        assert_eq!(tags["b"], Duration::minutes(30));
    }

    #[test]
    fn test_tagged_bucket_sampled_again_is_counted_once() {
        let mut store = Store::default();
        for i in 0..3 {
            store.upsert_sample(minute(i * 5), true);
        }
        store.compact_with(Compactor::with_min_samples(0));
        store.tag_span(minute(0), minute(15), Status::Working, "client");

        // next tick lands in the bucket that was just compacted
        store.upsert_sample(minute(10) + Duration::seconds(30), true);
        store.compact_with(Compactor::with_min_samples(0));
        assert_eq!(store.ranges().len(), 1);
        assert!(store.samples().is_empty());

        let worked = resolve_sparse(&store, &minute(0), &minute(60)).working_time();
        let tags = tag_time_between(&store, minute(0), minute(60));
        assert_eq!(worked, Duration::minutes(15));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags["client"], worked);
    }

    #[test]
    fn test_period_bounds() {
        let mut store = Store::default();
        // thursday of the same week
        store.append_range(
            Range::aligned(minute(-24 * 60), minute(-23 * 60), Status::Working).with_tag("x"),
        );
        // sunday before, in the previous week and month
        store.append_range(
            Range::aligned(minute(-5 * 24 * 60), minute(-5 * 24 * 60 + 60), Status::Working)
                .with_tag("x"),
        );
        let now = minute(12 * 60);
        assert!(tag_hours(&store, TagPeriod::Day, &now).is_empty());
        assert_eq!(tag_hours(&store, TagPeriod::Week, &now)["x"], Duration::hours(1));
        assert_eq!(tag_hours(&store, TagPeriod::Month, &now)["x"], Duration::hours(1));
    }

    #[test]
    fn test_ordered_tags_put_untagged_last() {
        let mut store = Store::default();
        store.append_range(Range::aligned(minute(0), minute(60), Status::Working).with_tag("zeta"));
        store.append_range(Range::aligned(minute(60), minute(90), Status::Working));
        store.append_range(Range::aligned(minute(90), minute(95), Status::Working).with_tag("alpha"));
        let day = tag_time_between(&store, minute(0), minute(100));
        let empty = Default::default();

        assert_eq!(
            ordered_tags([&day, &empty]),
            vec!["alpha".to_string(), "zeta".to_string(), UNTAGGED.to_string()]
        );
    }
}
