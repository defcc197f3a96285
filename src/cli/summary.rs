use std::{collections::BTreeMap, time::Duration as StdDuration};

use anyhow::Result;
use chrono::{DateTime, Duration, Local, TimeZone};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    daemon::shutdown::detect_shutdown,
    query::{
        focus::{focus_stats, FocusStats},
        goal::{is_workday, GoalProgress},
        periods::{best_worst_days, period_progress, trailing_days, BestWorstDays, DaySummary, PeriodProgress},
        tags::{tag_hours, TagPeriod},
        timeline::{daily_timeline, DailyTimeline},
    },
    store::{Store, StoreRepository},
    utils::clock::Clock,
};

use super::{palette::Palette, render::render_summary};

pub const WATCH_INTERVAL: StdDuration = StdDuration::from_secs(30);
const TRAILING_DAYS: u32 = 30;
const RECENT_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagBreakdown {
    pub day: BTreeMap<String, Duration>,
    pub week: BTreeMap<String, Duration>,
    pub month: BTreeMap<String, Duration>,
}

/// Everything the dashboard shows, computed from one snapshot of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub today: DailyTimeline,
    /// Only on workdays.
    pub daily_goal: Option<GoalProgress>,
    pub focus: FocusStats,
    pub progress: PeriodProgress,
    pub best_worst: Option<BestWorstDays>,
    pub last_week: Vec<DaySummary>,
    pub month_grid: Vec<DaySummary>,
    pub tags: TagBreakdown,
}

pub fn collect_summary<Tz: TimeZone>(store: &Store, now: &DateTime<Tz>) -> Summary {
    let today = daily_timeline(store, now, now);
    let daily_goal = is_workday(today.day, store.settings()).then(|| {
        GoalProgress::new(
            today.working,
            store.settings().daily_goal_minutes.as_duration(),
        )
    });
    let month_grid = trailing_days(store, now, TRAILING_DAYS);
    let last_week = month_grid[month_grid.len().saturating_sub(RECENT_DAYS as usize)..].to_vec();

    Summary {
        daily_goal,
        focus: focus_stats(store, now),
        progress: period_progress(store, now),
        best_worst: best_worst_days(store, now, TRAILING_DAYS),
        last_week,
        month_grid,
        tags: TagBreakdown {
            day: tag_hours(store, TagPeriod::Day, now),
            week: tag_hours(store, TagPeriod::Week, now),
            month: tag_hours(store, TagPeriod::Month, now),
        },
        today,
    }
}

async fn print_summary<Tz: TimeZone>(
    repository: &impl StoreRepository,
    now: DateTime<Tz>,
    palette: &Palette,
    clear: bool,
) -> Result<()> {
    let store = repository.load().await?;
    let text = render_summary(&collect_summary(&store, &now), palette);
    if clear {
        print!("\x1B[2J\x1B[H");
    }
    println!("{text}");
    Ok(())
}

/// Prints the dashboard once, or every [WATCH_INTERVAL] until interrupted when `watch` is set.
#[instrument(skip(repository, palette, clock))]
pub async fn process_summary_command(
    watch: bool,
    repository: impl StoreRepository,
    palette: Palette,
    clock: impl Clock,
) -> Result<()> {
    if !watch {
        return print_summary(&repository, clock.time().with_timezone(&Local), &palette, false).await;
    }

    let shutdown = CancellationToken::new();
    let refresh = async {
        let result = watch_summary(&repository, &palette, &clock, &shutdown).await;
        shutdown.cancel();
        result
    };
    let (_, result) = tokio::join!(detect_shutdown(shutdown.clone()), refresh);
    result
}

async fn watch_summary(
    repository: &impl StoreRepository,
    palette: &Palette,
    clock: &impl Clock,
    shutdown: &CancellationToken,
) -> Result<()> {
    let mut refresh_point = clock.instant();
    loop {
        refresh_point += WATCH_INTERVAL;
        print_summary(repository, clock.time().with_timezone(&Local), palette, true).await?;
        debug!("Rendered summary");

        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            _ = clock.sleep_until(refresh_point) => (),
        }
    }
}
