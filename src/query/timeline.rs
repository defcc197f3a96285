use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::{
    store::{Status, Store},
    utils::time::{day_start, next_day_start},
};

use super::resolver::{range_at, resolve};

/// One block of the daily timeline. Blocks alternate between working and idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineSegment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: Status,
    pub tag: Option<String>,
    pub note: Option<String>,
    /// Range that covers the first bucket of the segment, if any.
    pub range_index: Option<usize>,
}

impl TimelineSegment {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, moment: DateTime<Utc>) -> bool {
        self.start <= moment && moment < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTimeline {
    pub day: NaiveDate,
    pub segments: Vec<TimelineSegment>,
    pub working: Duration,
    pub idle: Duration,
}

impl DailyTimeline {
    pub fn total(&self) -> Duration {
        self.working + self.idle
    }

    pub fn segment_at(&self, moment: DateTime<Utc>) -> Option<&TimelineSegment> {
        self.segments.iter().find(|v| v.contains(moment))
    }
}

/// Timeline of the day containing `day`, from local midnight up to `now` when the day is still
/// running. Unsampled history shows up as idle. The bucket `now` falls into is not complete yet
/// and is left out.
pub fn daily_timeline<Tz: TimeZone>(
    store: &Store,
    day: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> DailyTimeline {
    let start = day_start(day);
    let end = next_day_start(day).min(now.clone());
    let resolved = resolve(store, &start, &end);

    let segments = resolved
        .runs()
        .into_iter()
        .map(|run| {
            let range = range_at(store, run.start);
            TimelineSegment {
                start: run.start,
                end: run.end,
                status: run.status,
                tag: range.and_then(|v| v.1.tag.clone()),
                note: range.and_then(|v| v.1.note.clone()),
                range_index: range.map(|v| v.0),
            }
        })
        .collect::<Vec<_>>();

    let working = segments
        .iter()
        .filter(|v| v.status.is_working())
        .fold(Duration::zero(), |acc, v| acc + v.duration());
    let idle = segments
        .iter()
        .filter(|v| !v.status.is_working())
        .fold(Duration::zero(), |acc, v| acc + v.duration());

    DailyTimeline {
        day: day.date_naive(),
        segments,
        working,
        idle,
    }
}
