use std::{collections::BTreeSet, fmt::Display, str::FromStr};

use anyhow::{anyhow, bail};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::bucket::{ceil_bucket, floor_bucket, BUCKET_WIDTH};

/// Status of a single bucket. Stored on disk as `0` for idle and `1` for working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Status {
    #[default]
    Idle,
    Working,
}

impl Status {
    pub fn from_working(working: bool) -> Self {
        if working {
            Status::Working
        } else {
            Status::Idle
        }
    }

    pub fn is_working(self) -> bool {
        self == Status::Working
    }
}

impl From<Status> for u8 {
    fn from(value: Status) -> Self {
        match value {
            Status::Idle => 0,
            Status::Working => 1,
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::Idle),
            1 => Ok(Status::Working),
            v => Err(format!("status must be 0 or 1, got {v}")),
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Idle => write!(f, "idle"),
            Status::Working => write!(f, "working"),
        }
    }
}

/// A compacted run of same-status buckets, `[start, end)`.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Range {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub end: DateTime<Utc>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Range {
    /// Creates a range snapped onto the bucket grid of `start`'s timezone: the start is floored
    /// and the end is ceiled, so the result always covers at least one whole bucket.
    pub fn aligned<Tz: TimeZone>(start: DateTime<Tz>, end: DateTime<Tz>, status: Status) -> Self {
        let start = floor_bucket(start);
        let end = ceil_bucket(end).max(start.clone() + BUCKET_WIDTH);
        Self {
            start: start.to_utc(),
            end: end.to_utc(),
            status,
            tag: None,
            note: None,
        }
    }

    pub fn with_tag(self, tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..self
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, moment: DateTime<Utc>) -> bool {
        self.start <= moment && moment < self.end
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }

    /// Part of the range inside `[from, to)`.
    pub fn clamp(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.start.max(from);
        let end = self.end.min(to);
        (start < end).then_some((start, end))
    }
}

pub const DEFAULT_DAILY_GOAL_MINUTES: u32 = 480;

/// Daily goal in minutes. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct DailyGoal(u32);

impl DailyGoal {
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes > 0).then_some(Self(minutes))
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::minutes(self.0 as i64)
    }
}

impl Default for DailyGoal {
    fn default() -> Self {
        Self(DEFAULT_DAILY_GOAL_MINUTES)
    }
}

/// A stored goal of 0 is treated as missing.
impl From<u32> for DailyGoal {
    fn from(value: u32) -> Self {
        Self::from_minutes(value).unwrap_or_default()
    }
}

impl From<DailyGoal> for u32 {
    fn from(value: DailyGoal) -> Self {
        value.0
    }
}

/// Accepts `HH:MM`.
impl FromStr for DailyGoal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((hours, minutes)) = s.trim().split_once(':') else {
            bail!("invalid time format {s:?}, use HH:MM");
        };
        let hours = hours.trim().parse::<u32>()?;
        let minutes = minutes.trim().parse::<u32>()?;
        if minutes >= 60 {
            bail!("minutes must be below 60 in {s:?}");
        }
        let Some(total) = hours.checked_mul(60).and_then(|v| v.checked_add(minutes)) else {
            bail!("daily goal {s:?} is too long");
        };
        DailyGoal::from_minutes(total)
            .ok_or_else(|| anyhow!("daily goal must be longer than 0 minutes"))
    }
}

const DAY_NAMES: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Set of ISO weekday ordinals, 1 for Monday through 7 for Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WorkDays(BTreeSet<u8>);

impl WorkDays {
    pub fn new(days: impl IntoIterator<Item = u8>) -> anyhow::Result<Self> {
        let days = days.into_iter().collect::<BTreeSet<_>>();
        if let Some(day) = days.iter().find(|v| !(1..=7).contains(*v)) {
            bail!("work day {day} is outside of 1..=7");
        }
        if days.is_empty() {
            bail!("at least one work day is required");
        }
        Ok(Self(days))
    }

    pub fn contains(&self, ordinal: u8) -> bool {
        self.0.contains(&ordinal)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

impl Default for WorkDays {
    fn default() -> Self {
        Self((1..=5).collect())
    }
}

/// An empty stored list falls back to Monday through Friday.
impl TryFrom<Vec<u8>> for WorkDays {
    type Error = anyhow::Error;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Ok(Self::default());
        }
        Self::new(value)
    }
}

impl From<WorkDays> for Vec<u8> {
    fn from(value: WorkDays) -> Self {
        value.0.into_iter().collect()
    }
}

fn day_ordinal(name: &str) -> Option<u8> {
    let name = name.trim().to_lowercase();
    DAY_NAMES
        .iter()
        .position(|v| *v == name)
        .map(|v| v as u8 + 1)
}

/// Accepts either an ascending range `Mon-Fri` or a list `Mon,Wed,Fri`.
impl FromStr for WorkDays {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((from, to)) = s.split_once('-') {
            let (Some(from), Some(to)) = (day_ordinal(from), day_ordinal(to)) else {
                bail!("invalid day names in range {s:?}");
            };
            if from > to {
                bail!("day range {s:?} must go forward within a week");
            }
            WorkDays::new(from..=to)
        } else {
            let days = s
                .split(',')
                .map(|v| day_ordinal(v).ok_or_else(|| anyhow!("invalid day name: {v}")))
                .collect::<anyhow::Result<Vec<_>>>()?;
            WorkDays::new(days)
        }
    }
}

impl Display for WorkDays {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self
            .iter()
            .map(|v| DAY_NAMES[(v - 1) as usize])
            .collect::<Vec<_>>();
        write!(f, "{}", names.join(","))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub daily_goal_minutes: DailyGoal,
    #[serde(default)]
    pub work_days: WorkDays,
}

/// A single validated change to [Settings], written as `key=value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigUpdate {
    DailyGoal(DailyGoal),
    WorkDays(WorkDays),
}

impl FromStr for ConfigUpdate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((key, value)) = s.split_once('=') else {
            bail!("invalid config format {s:?}, use key=value");
        };
        match key.trim() {
            "dailygoal" => Ok(ConfigUpdate::DailyGoal(value.parse()?)),
            "workdays" => Ok(ConfigUpdate::WorkDays(value.parse()?)),
            other => bail!("unknown config key: {other}"),
        }
    }
}

impl Display for ConfigUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigUpdate::DailyGoal(goal) => {
                write!(f, "dailygoal={:02}:{:02}", goal.minutes() / 60, goal.minutes() % 60)
            }
            ConfigUpdate::WorkDays(days) => write!(f, "workdays={days}"),
        }
    }
}
