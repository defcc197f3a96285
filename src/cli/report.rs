use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use clap::{Parser, ValueEnum};

use crate::{
    query::{
        goal::{is_workday, GoalProgress},
        periods::{period_report, Period},
        timeline::daily_timeline,
    },
    store::{Store, StoreRepository},
};

use super::{
    dates::{parse_moment, DateStyle, DATE_EXAMPLES},
    palette::Palette,
    render::{render_period, render_timeline},
};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ReportRange {
    Today,
    Week,
    Month,
    Year,
}

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(long, short, value_enum, default_value_t = ReportRange::Today)]
    range: ReportRange,
    #[arg(long, short, help = format!("Any moment inside the reported period. {DATE_EXAMPLES}"))]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

/// Renders the report of the period containing `at`. Days after `now` have no data, and today
/// ends at `now`.
pub fn report_text<Tz: TimeZone>(
    store: &Store,
    range: ReportRange,
    at: &DateTime<Tz>,
    now: &DateTime<Tz>,
    palette: &Palette,
) -> String
where
    Tz::Offset: Display,
{
    let period = match range {
        ReportRange::Today => {
            let timeline = daily_timeline(store, at, now);
            let goal = is_workday(timeline.day, store.settings()).then(|| {
                GoalProgress::new(
                    timeline.working,
                    store.settings().daily_goal_minutes.as_duration(),
                )
            });
            return render_timeline(&timeline, &at.timezone(), goal.as_ref(), palette);
        }
        ReportRange::Week => Period::Week,
        ReportRange::Month => Period::Month,
        ReportRange::Year => Period::Year,
    };
    render_period(&period_report(store, period, at), palette)
}

pub async fn process_report_command(
    ReportCommand {
        range,
        date,
        date_style,
    }: ReportCommand,
    repository: impl StoreRepository,
    palette: Palette,
) -> Result<()> {
    let now = Local::now();
    let at = match date {
        Some(text) => parse_moment(&text, &now, date_style)?,
        None => now,
    };
    let store = repository.load().await?;
    println!("{}", report_text(&store, range, &at, &now, &palette));
    Ok(())
}
