use std::fmt::Display;

use chrono::{DateTime, Duration, Months, NaiveDate, TimeZone};
use clap::ValueEnum;
use tracing::instrument;

use crate::{
    store::Store,
    utils::time::{
        day_start_of, days_between, month_start, next_month_start, next_year_start, week_start,
        year_start,
    },
};

use super::{
    goal::{goal_for_days, is_workday, GoalProgress},
    resolver::resolve_sparse,
};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
    Year,
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Week => write!(f, "week"),
            Period::Month => write!(f, "month"),
            Period::Year => write!(f, "year"),
        }
    }
}

impl Period {
    /// Calendar bounds `[start, end)` of the period containing `at`. Weeks start on Monday.
    pub fn bounds<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> (DateTime<Tz>, DateTime<Tz>) {
        match self {
            Period::Week => {
                let start = week_start(at);
                let end = day_start_of(
                    &at.timezone(),
                    start.date_naive() + Duration::days(7),
                );
                (start, end)
            }
            Period::Month => (month_start(at), next_month_start(at)),
            Period::Year => (year_start(at), next_year_start(at)),
        }
    }
}

/// One row of a period table. For weeks and months a row is a day, for years a month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodRow {
    pub start: NaiveDate,
    pub working: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodReport {
    pub period: Period,
    pub start: NaiveDate,
    pub rows: Vec<PeriodRow>,
    pub total: Duration,
    /// Missing when a week or month has no configured workdays.
    pub goal: Option<GoalProgress>,
}

/// Working time of the local day `date`.
pub fn day_working<Tz: TimeZone>(store: &Store, tz: &Tz, date: NaiveDate) -> Duration {
    let start = day_start_of(tz, date);
    let end = day_start_of(tz, date.succ_opt().unwrap_or(NaiveDate::MAX));
    resolve_sparse(store, &start, &end).working_time()
}

/// Daily (week, month) or monthly (year) working totals of the period containing `at`, plus
/// progress against the goal of all workdays in the period.
#[instrument(skip(store, at))]
pub fn period_report<Tz: TimeZone>(store: &Store, period: Period, at: &DateTime<Tz>) -> PeriodReport {
    let tz = at.timezone();
    let (start, end) = period.bounds(at);
    let (first_day, end_day) = (start.date_naive(), end.date_naive());

    let rows = match period {
        Period::Week | Period::Month => days_between(first_day, end_day)
            .map(|day| PeriodRow {
                start: day,
                working: day_working(store, &tz, day),
            })
            .collect::<Vec<_>>(),
        Period::Year => (0..12)
            .filter_map(|v| first_day.checked_add_months(Months::new(v)))
            .map(|month| {
                let next = month
                    .checked_add_months(Months::new(1))
                    .unwrap_or(NaiveDate::MAX);
                let working = resolve_sparse(
                    store,
                    &day_start_of(&tz, month),
                    &day_start_of(&tz, next),
                )
                .working_time();
                PeriodRow {
                    start: month,
                    working,
                }
            })
            .collect::<Vec<_>>(),
    };

    let total = rows
        .iter()
        .fold(Duration::zero(), |acc, v| acc + v.working);

    let workdays = days_between(first_day, end_day)
        .filter(|v| is_workday(*v, store.settings()))
        .count();
    let goal = store.settings().daily_goal_minutes.as_duration() * workdays as i32;
    let goal = match period {
        Period::Year => Some(GoalProgress::new(total, goal)),
        Period::Week | Period::Month if workdays > 0 => Some(GoalProgress::new(total, goal)),
        Period::Week | Period::Month => None,
    };

    PeriodReport {
        period,
        start: first_day,
        rows,
        total,
        goal,
    }
}

/// Progress of the running week, month and year against their full goals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodProgress {
    pub week: GoalProgress,
    pub month: GoalProgress,
    pub year: GoalProgress,
}

pub fn period_progress<Tz: TimeZone>(store: &Store, now: &DateTime<Tz>) -> PeriodProgress {
    let progress = |period: Period| {
        let (start, end) = period.bounds(now);
        let worked = resolve_sparse(store, &start, &end).working_time();
        let goal = goal_for_days(
            days_between(start.date_naive(), end.date_naive()),
            store.settings(),
        );
        GoalProgress::new(worked, goal)
    };
    PeriodProgress {
        week: progress(Period::Week),
        month: progress(Period::Month),
        year: progress(Period::Year),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub working: Duration,
    pub workday: bool,
    pub goal_met: bool,
}

/// The last `days` days ending with the day of `now`, oldest first.
pub fn trailing_days<Tz: TimeZone>(store: &Store, now: &DateTime<Tz>, days: u32) -> Vec<DaySummary> {
    let tz = now.timezone();
    let today = now.date_naive();
    let goal = store.settings().daily_goal_minutes.as_duration();
    (0..days as i64)
        .rev()
        .map(|offset| today - Duration::days(offset))
        .map(|date| {
            let working = day_working(store, &tz, date);
            let workday = is_workday(date, store.settings());
            DaySummary {
                date,
                working,
                workday,
                goal_met: workday && working >= goal,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestWorstDays {
    pub best: (NaiveDate, Duration),
    pub worst: (NaiveDate, Duration),
}

/// Best and worst day among the last `days` days. Days without any working time are ignored,
/// so there is nothing to report when no day was worked. Ties go to the earlier day.
pub fn best_worst_days<Tz: TimeZone>(
    store: &Store,
    now: &DateTime<Tz>,
    days: u32,
) -> Option<BestWorstDays> {
    let worked = trailing_days(store, now, days)
        .into_iter()
        .filter(|v| v.working > Duration::zero())
        .collect::<Vec<_>>();

    let mut best = worked.first()?;
    let mut worst = best;
    for day in &worked {
        if day.working > best.working {
            best = day;
        }
        if day.working < worst.working {
            worst = day;
        }
    }
    Some(BestWorstDays {
        best: (best.date, best.working),
        worst: (worst.date, worst.working),
    })
}
