use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::utils::bucket::BUCKET_WIDTH;

use super::entities::{Range, Status};

/// Raw sample count at which the store asks for compaction.
pub const COMPACTION_TRIGGER: usize = 100;

/// Below this many raw samples compaction is not worth a rewrite.
pub const MIN_COMPACTION_SAMPLES: usize = 50;

/// Turns raw per-bucket samples into the minimal list of contiguous same-status [Range]s.
#[derive(Debug, Clone, Copy)]
pub struct Compactor {
    min_samples: usize,
}

impl Default for Compactor {
    fn default() -> Self {
        Self {
            min_samples: MIN_COMPACTION_SAMPLES,
        }
    }
}

impl Compactor {
    pub fn with_min_samples(min_samples: usize) -> Self {
        Self { min_samples }
    }

    /// Moves every sample into `ranges`. Samples that repeat the status of the range already
    /// covering their bucket are dropped. Returns the number of ranges appended, 0 when there
    /// were too few samples to bother.
    pub fn compact(
        &self,
        samples: &mut BTreeMap<DateTime<Utc>, Status>,
        ranges: &mut Vec<Range>,
    ) -> usize {
        if samples.is_empty() || samples.len() < self.min_samples {
            return 0;
        }
        let fresh = samples
            .iter()
            .map(|(k, v)| (*k, *v))
            .filter(|(moment, status)| {
                ranges
                    .iter()
                    .find(|v| v.contains(*moment))
                    .map_or(true, |v| v.status != *status)
            })
            .collect::<Vec<_>>();
        let collapsed = collapse_samples(fresh);
        debug!(
            "Compacted {} samples into {} ranges",
            samples.len(),
            collapsed.len()
        );
        let appended = collapsed.len();
        ranges.extend(collapsed);
        samples.clear();
        appended
    }
}

/// Groups samples into maximal runs where neighbours are exactly one bucket apart and share a
/// status. A missing bucket always ends a run. Input must be sorted by instant.
fn collapse_samples(samples: impl IntoIterator<Item = (DateTime<Utc>, Status)>) -> Vec<Range> {
    let mut ranges: Vec<Range> = Vec::new();

    for (moment, status) in samples {
        match ranges.last_mut() {
            Some(range) if range.status == status && range.end == moment => {
                range.end = moment + BUCKET_WIDTH;
            }
            Some(_) | None => ranges.push(Range {
                start: moment,
                end: moment + BUCKET_WIDTH,
                status,
                tag: None,
                note: None,
            }),
        }
    }

    ranges
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use crate::store::entities::{Range, Status};

    use super::{collapse_samples, Compactor};

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn minute(m: i64) -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START_DATE) + Duration::minutes(m)
    }

    fn range(start: i64, end: i64, status: Status) -> Range {
        Range {
            start: minute(start),
            end: minute(end),
            status,
            tag: None,
            note: None,
        }
    }

    #[test]
    fn test_gap_breaks_run() {
        let samples = [
            (minute(0), Status::Working),
            (minute(5), Status::Working),
            (minute(10), Status::Working),
            (minute(20), Status::Working),
        ];
        assert_eq!(
            collapse_samples(samples),
            vec![
                range(0, 15, Status::Working),
                range(20, 25, Status::Working)
            ]
        );
    }

    #[test]
    fn test_status_change_breaks_run() {
        let samples = [
            (minute(0), Status::Idle),
            (minute(5), Status::Working),
            (minute(10), Status::Working),
            (minute(15), Status::Idle),
        ];
        assert_eq!(
            collapse_samples(samples),
            vec![
                range(0, 5, Status::Idle),
                range(5, 15, Status::Working),
                range(15, 20, Status::Idle),
            ]
        );
    }

    #[test]
    fn test_compactor_orders_by_instant_and_clears_samples() {
        let mut samples = BTreeMap::new();
        // inserted out of order on purpose
        samples.insert(minute(10), Status::Working);
        samples.insert(minute(0), Status::Working);
        samples.insert(minute(5), Status::Working);
        let mut ranges = vec![];

        let appended = Compactor::with_min_samples(0).compact(&mut samples, &mut ranges);

        assert_eq!(appended, 1);
        assert!(samples.is_empty());
        assert_eq!(ranges, vec![range(0, 15, Status::Working)]);
    }

    #[test]
    fn test_compactor_drops_samples_covered_by_same_status() {
        let mut samples = BTreeMap::new();
        samples.insert(minute(10), Status::Working);
        samples.insert(minute(15), Status::Working);
        samples.insert(minute(20), Status::Working);
        let mut ranges = vec![range(0, 15, Status::Working), range(15, 20, Status::Idle)];

        let appended = Compactor::with_min_samples(0).compact(&mut samples, &mut ranges);

        assert_eq!(appended, 1);
        assert!(samples.is_empty());
        assert_eq!(
            ranges,
            vec![
                range(0, 15, Status::Working),
                range(15, 20, Status::Idle),
                range(15, 25, Status::Working),
            ]
        );
    }

    #[test]
    fn test_compactor_skips_small_sample_sets() {
        let mut samples = (0..49)
            .map(|v| (minute(v * 5), Status::Working))
            .collect::<BTreeMap<_, _>>();
        let mut ranges = vec![];

        assert_eq!(Compactor::default().compact(&mut samples, &mut ranges), 0);
        assert_eq!(samples.len(), 49);
        assert!(ranges.is_empty());

        samples.insert(minute(49 * 5), Status::Idle);
        assert_eq!(Compactor::default().compact(&mut samples, &mut ranges), 2);
        assert_eq!(
            ranges,
            vec![
                range(0, 49 * 5, Status::Working),
                range(49 * 5, 50 * 5, Status::Idle)
            ]
        );
    }
}
