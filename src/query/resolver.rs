use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::trace;

use crate::{
    store::{Range, Status, Store},
    utils::bucket::{bucket_grid, floor_bucket, BUCKET_WIDTH},
};

/// Per-bucket status reconstructed for a window, ordered by bucket start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedWindow {
    buckets: BTreeMap<DateTime<Utc>, Status>,
}

/// A maximal run of neighbouring buckets with the same status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRun {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: Status,
}

impl StatusRun {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl ResolvedWindow {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, bucket: DateTime<Utc>) -> Option<Status> {
        self.buckets.get(&bucket).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, Status)> + '_ {
        self.buckets.iter().map(|(k, v)| (*k, *v))
    }

    pub fn statuses(&self) -> impl Iterator<Item = Status> + '_ {
        self.buckets.values().copied()
    }

    pub fn time_in(&self, status: Status) -> Duration {
        BUCKET_WIDTH * self.statuses().filter(|v| *v == status).count() as i32
    }

    pub fn working_time(&self) -> Duration {
        self.time_in(Status::Working)
    }

    /// Merges consecutive buckets into runs. A run only continues across buckets that are
    /// exactly one width apart, so sparse windows never bridge gaps.
    pub fn runs(&self) -> Vec<StatusRun> {
        let mut runs: Vec<StatusRun> = Vec::new();
        for (start, status) in self.iter() {
            match runs.last_mut() {
                Some(run) if run.status == status && run.end == start => {
                    run.end = start + BUCKET_WIDTH;
                }
                Some(_) | None => runs.push(StatusRun {
                    start,
                    end: start + BUCKET_WIDTH,
                    status,
                }),
            }
        }
        runs
    }
}

/// Reconstructs status over the full bucket grid `[floor(start), floor(end))`. Buckets without
/// any data are idle, then ranges are laid over them, then raw samples, which are newer than
/// anything compacted.
pub fn resolve<Tz: TimeZone>(store: &Store, start: &DateTime<Tz>, end: &DateTime<Tz>) -> ResolvedWindow {
    let mut buckets = bucket_grid(start, end)
        .map(|v| (v, Status::Idle))
        .collect::<BTreeMap<_, _>>();
    let (Some(first), Some(last)) = (
        buckets.first_key_value().map(|v| *v.0),
        buckets.last_key_value().map(|v| *v.0),
    ) else {
        return ResolvedWindow::default();
    };
    let grid_end = last + BUCKET_WIDTH;

    for range in store.ranges().iter().filter(|v| v.overlaps(first, grid_end)) {
        for bucket in expand_range(range, &start.timezone(), first, grid_end) {
            if let Some(status) = buckets.get_mut(&bucket) {
                *status = range.status;
            }
        }
    }

    for (bucket, sample) in store.samples().range(first..grid_end) {
        if let Some(status) = buckets.get_mut(bucket) {
            *status = *sample;
        }
    }

    trace!("Resolved {} buckets from {first} to {grid_end}", buckets.len());
    ResolvedWindow { buckets }
}

/// Like [resolve], but only buckets that have data and start inside `[start, end)` are
/// present. Used where only matching buckets are summed.
pub fn resolve_sparse<Tz: TimeZone>(
    store: &Store,
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
) -> ResolvedWindow {
    let from = start.to_utc();
    let to = end.to_utc();
    let mut buckets = BTreeMap::new();
    if from >= to {
        return ResolvedWindow::default();
    }

    for range in store.ranges().iter().filter(|v| v.overlaps(from, to)) {
        for bucket in expand_range(range, &start.timezone(), from, to) {
            buckets.insert(bucket, range.status);
        }
    }

    for (bucket, sample) in store.samples().range(from..to) {
        buckets.insert(*bucket, *sample);
    }

    ResolvedWindow { buckets }
}

/// Bucket starts of `range` that fall into `[from, to)`.
fn expand_range<Tz: TimeZone>(
    range: &Range,
    tz: &Tz,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> impl Iterator<Item = DateTime<Utc>> {
    let first = floor_bucket(range.start.with_timezone(tz)).to_utc();
    let end = range.end.min(to);
    std::iter::successors(Some(first), |v| Some(*v + BUCKET_WIDTH))
        .take_while(move |v| *v < end)
        .filter(move |v| *v >= from)
}

/// First range containing `moment`, used for tag and note lookup.
pub fn range_at(store: &Store, moment: DateTime<Utc>) -> Option<(usize, &Range)> {
    store
        .range_at(moment)
        .map(|index| (index, &store.ranges()[index]))
}
