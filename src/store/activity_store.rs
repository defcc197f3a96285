use std::collections::{BTreeMap, BTreeSet};

use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::utils::bucket::floor_bucket;

use super::{
    compactor::{Compactor, COMPACTION_TRIGGER},
    entities::{ConfigUpdate, Range, Settings, Status},
};

/// The persisted document. Owns raw samples, compacted ranges, settings and the tag catalogue;
/// everything else only reads it or mutates it through the methods below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default, with = "bins_ser")]
    bins: BTreeMap<DateTime<Utc>, Status>,
    #[serde(default)]
    ranges: Vec<Range>,
    #[serde(default)]
    config: Settings,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    tags: BTreeSet<String>,
}

impl Store {
    pub fn samples(&self) -> &BTreeMap<DateTime<Utc>, Status> {
        &self.bins
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn settings(&self) -> &Settings {
        &self.config
    }

    /// Previously used tags, sorted. Only used for suggestions.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Records an observation for the bucket containing `moment`. A working observation
    /// promotes an idle bucket, an idle one never demotes a working bucket. A bucket that was
    /// already compacted starts from its range's status.
    pub fn upsert_sample<Tz: TimeZone>(&mut self, moment: DateTime<Tz>, working: bool) {
        let bucket = floor_bucket(moment).to_utc();
        let compacted = self.range_at(bucket).map(|v| self.ranges[v].status);
        let status = self
            .bins
            .entry(bucket)
            .or_insert(compacted.unwrap_or(Status::Idle));
        if working {
            *status = Status::Working;
        }
    }

    pub fn should_compact(&self) -> bool {
        self.bins.len() >= COMPACTION_TRIGGER
    }

    pub fn compact(&mut self) -> usize {
        self.compact_with(Compactor::default())
    }

    pub fn compact_with(&mut self, compactor: Compactor) -> usize {
        compactor.compact(&mut self.bins, &mut self.ranges)
    }

    pub fn append_range(&mut self, range: Range) {
        self.ranges.push(range);
    }

    /// Index of the first range containing `moment`. Ranges may overlap after tagging, the
    /// earliest appended one wins.
    pub fn range_at(&self, moment: DateTime<Utc>) -> Option<usize> {
        self.ranges.iter().position(|v| v.contains(moment))
    }

    pub fn set_range_tag(&mut self, index: usize, tag: &str) -> Result<()> {
        let tag = normalize_label(tag);
        let range = self
            .ranges
            .get_mut(index)
            .ok_or_else(|| anyhow!("No range with index {index}"))?;
        range.tag = tag.clone();
        if let Some(tag) = tag {
            self.tags.insert(tag);
        }
        Ok(())
    }

    /// Tags the span `[start, end)` that is displayed as one timeline block. When the block
    /// starts inside an existing range that range is retagged, otherwise a new aligned range is
    /// appended. An empty tag clears it. Returns the index of the tagged range.
    pub fn tag_span<Tz: TimeZone>(
        &mut self,
        start: DateTime<Tz>,
        end: DateTime<Tz>,
        status: Status,
        tag: &str,
    ) -> usize {
        let tag = normalize_label(tag);
        let index = self.span_range_index(start, end, status);
        self.ranges[index].tag = tag.clone();
        if let Some(tag) = tag {
            self.tags.insert(tag);
        }
        index
    }

    /// Same as [Store::tag_span] for free text notes.
    pub fn annotate_span<Tz: TimeZone>(
        &mut self,
        start: DateTime<Tz>,
        end: DateTime<Tz>,
        status: Status,
        note: &str,
    ) -> usize {
        let index = self.span_range_index(start, end, status);
        self.ranges[index].note = normalize_label(note);
        index
    }

    fn span_range_index<Tz: TimeZone>(
        &mut self,
        start: DateTime<Tz>,
        end: DateTime<Tz>,
        status: Status,
    ) -> usize {
        if let Some(index) = self.range_at(floor_bucket(start.clone()).to_utc()) {
            return index;
        }

        let range = Range::aligned(start, end, status);
        // Samples inside the span move into the new range, otherwise the next compaction would
        // produce a second range over the same buckets.
        let absorbed = self
            .bins
            .range(range.start..range.end)
            .filter(|(_, v)| **v == status)
            .map(|(k, _)| *k)
            .collect::<Vec<_>>();
        for moment in &absorbed {
            self.bins.remove(moment);
        }
        debug!(
            "Created range {}..{} absorbing {} samples",
            range.start,
            range.end,
            absorbed.len()
        );
        self.ranges.push(range);
        self.ranges.len() - 1
    }

    pub fn apply_config(&mut self, update: ConfigUpdate) {
        info!("Applying config {update}");
        match update {
            ConfigUpdate::DailyGoal(goal) => self.config.daily_goal_minutes = goal,
            ConfigUpdate::WorkDays(days) => self.config.work_days = days,
        }
    }
}

fn normalize_label(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Samples are keyed by unix seconds written as strings, `{"1712304000": 1}`.
mod bins_ser {
    use std::collections::BTreeMap;

    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    use crate::store::entities::Status;

    pub fn serialize<S>(bins: &BTreeMap<DateTime<Utc>, Status>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        bins.iter()
            .map(|(k, v)| (k.timestamp(), *v))
            .collect::<BTreeMap<_, _>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<DateTime<Utc>, Status>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<i64, Status>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(k, v)| {
                DateTime::from_timestamp(k, 0)
                    .map(|k| (k, v))
                    .ok_or_else(|| D::Error::custom(format!("timestamp {k} is out of range")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use crate::store::{
        compactor::Compactor,
        entities::{ConfigUpdate, Range, Status},
    };

    use super::Store;

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn minute(m: i64) -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START_DATE) + Duration::minutes(m)
    }

    #[test]
    fn test_sticky_promotion() {
        let mut store = Store::default();
        store.upsert_sample(minute(0), false);
        store.upsert_sample(minute(1), true);
        assert_eq!(store.samples()[&minute(0)], Status::Working);

        store.upsert_sample(minute(5), true);
        store.upsert_sample(minute(7), false);
        assert_eq!(store.samples()[&minute(5)], Status::Working);

        store.upsert_sample(minute(10), false);
        store.upsert_sample(minute(14), false);
        assert_eq!(store.samples()[&minute(10)], Status::Idle);
        assert_eq!(store.samples().len(), 3);
    }

    #[test]
    fn test_compaction_trigger() {
        let mut store = Store::default();
        for i in 0..99 {
            store.upsert_sample(minute(i * 5), i % 10 < 5);
        }
        assert!(!store.should_compact());
        store.upsert_sample(minute(99 * 5), true);
        assert!(store.should_compact());

        assert_eq!(store.compact(), 20);
        assert!(store.samples().is_empty());
        assert!(!store.should_compact());
    }

    #[test]
    fn test_compacted_bucket_stays_working() {
        let mut store = Store::default();
        store.upsert_sample(minute(0), true);
        store.compact_with(Compactor::with_min_samples(0));

        store.upsert_sample(minute(2), false);
        assert_eq!(store.samples()[&minute(0)], Status::Working);
    }

    #[test]
    fn test_tag_span_retags_covering_range() {
        let mut store = Store::default();
        store.append_range(Range::aligned(minute(0), minute(60), Status::Working));

        let index = store.tag_span(minute(10), minute(30), Status::Working, "writing");
        assert_eq!(index, 0);
        assert_eq!(store.ranges()[0].tag.as_deref(), Some("writing"));
        assert_eq!(store.tags().collect::<Vec<_>>(), vec!["writing"]);

        store.tag_span(minute(10), minute(30), Status::Working, "  ");
        assert_eq!(store.ranges()[0].tag, None);
    }

    #[test]
    fn test_tag_span_absorbs_samples_into_new_range() {
        let mut store = Store::default();
        for i in 0..3 {
            store.upsert_sample(minute(i * 5), true);
        }
        store.upsert_sample(minute(15), false);

        let index = store.tag_span(minute(0), minute(15), Status::Working, "review");
        assert_eq!(index, 0);
        assert_eq!(store.ranges()[0].start, minute(0));
        assert_eq!(store.ranges()[0].end, minute(15));
        assert_eq!(store.samples().len(), 1);

        // Compacting the remainder never produces an overlapping range
        store.compact_with(Compactor::with_min_samples(0));
        assert_eq!(store.ranges().len(), 2);
        assert!(!store.ranges()[1].overlaps(minute(0), minute(15)));
    }

    #[test]
    fn test_annotate_span() {
        let mut store = Store::default();
        let index = store.annotate_span(minute(0), minute(10), Status::Idle, "lunch");
        assert_eq!(store.ranges()[index].note.as_deref(), Some("lunch"));
        assert_eq!(store.tags().count(), 0);
        assert!(store.set_range_tag(5, "nope").is_err());
    }

    #[test]
    fn test_apply_config() -> anyhow::Result<()> {
        let mut store = Store::default();
        store.apply_config("dailygoal=06:00".parse::<ConfigUpdate>()?);
        store.apply_config("workdays=Sat-Sun".parse::<ConfigUpdate>()?);
        assert_eq!(store.settings().daily_goal_minutes.minutes(), 360);
        assert!(store.settings().work_days.contains(6));
        assert!(!store.settings().work_days.contains(1));
        Ok(())
    }

    #[test]
    fn test_document_shape() -> anyhow::Result<()> {
        let mut store = Store::default();
        store.upsert_sample(minute(0), true);
        store.tag_span(minute(10), minute(20), Status::Working, "ops");

        let json = serde_json::to_value(&store)?;
        let key = minute(0).timestamp().to_string();
        assert_eq!(json["bins"][key.as_str()], 1);
        assert_eq!(json["ranges"][0]["tag"], "ops");
        assert_eq!(json["config"]["daily_goal_minutes"], 480);
        assert_eq!(json["config"]["work_days"], serde_json::json!([1, 2, 3, 4, 5]));
        assert_eq!(json["tags"], serde_json::json!(["ops"]));

        let parsed: Store = serde_json::from_value(json)?;
        assert_eq!(parsed, store);
        Ok(())
    }

    #[test]
    fn test_missing_sections_default() -> anyhow::Result<()> {
        let store: Store = serde_json::from_str(r#"{"bins": {"1530662400": 0}}"#)?;
        assert_eq!(store.samples().len(), 1);
        assert!(store.ranges().is_empty());
        assert_eq!(store.settings().daily_goal_minutes.minutes(), 480);
        assert!(serde_json::from_str::<Store>(r#"{"bins": {"abc": 1}}"#).is_err());
        Ok(())
    }
}
