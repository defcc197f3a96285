use std::fmt::Display;

use chrono::{Duration, NaiveDate};

use crate::{
    store::entities::Settings,
    utils::{format::human_duration, time::weekday_ordinal},
};

/// Worked time against an expected amount of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalProgress {
    pub worked: Duration,
    pub goal: Duration,
}

impl GoalProgress {
    pub fn new(worked: Duration, goal: Duration) -> Self {
        Self { worked, goal }
    }

    /// `floor(worked * 100 / goal)`, or 0 when there is no goal.
    pub fn percentage(&self) -> i64 {
        let goal = self.goal.num_minutes();
        if goal <= 0 {
            0
        } else {
            self.worked.num_minutes() * 100 / goal
        }
    }

    pub fn is_met(&self) -> bool {
        self.goal > Duration::zero() && self.worked >= self.goal
    }
}

/// Prints `50% of 8 hrs`, or just `0%` without a goal.
impl Display for GoalProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.goal.num_minutes() <= 0 {
            write!(f, "0%")
        } else {
            write!(f, "{}% of {}", self.percentage(), human_duration(self.goal))
        }
    }
}

pub fn format_percentage(worked: Duration, goal: Duration) -> String {
    GoalProgress::new(worked, goal).to_string()
}

pub fn is_workday(date: NaiveDate, settings: &Settings) -> bool {
    settings.work_days.contains(weekday_ordinal(date))
}

/// Expected work over `days`: the daily goal for every configured workday among them.
pub fn goal_for_days(days: impl IntoIterator<Item = NaiveDate>, settings: &Settings) -> Duration {
    let workdays = days
        .into_iter()
        .filter(|v| is_workday(*v, settings))
        .count();
    settings.daily_goal_minutes.as_duration() * workdays as i32
}
