//! Text output of the reports. Everything returns a `String` so it can be tested with
//! [Palette::plain].

use std::{collections::BTreeMap, fmt::Display};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
    query::{
        goal::GoalProgress,
        periods::{DaySummary, Period, PeriodReport},
        tags::ordered_tags,
        timeline::DailyTimeline,
    },
    store::Status,
    utils::format::human_duration,
};

use super::{palette::Palette, summary::Summary};

const BAR_WIDTH: usize = 20;

fn local_time<Tz: TimeZone>(moment: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    moment.with_timezone(tz).format("%H:%M").to_string()
}

/// `[#####...............]`, capped at full.
pub fn progress_bar(percentage: i64, width: usize) -> String {
    let filled = (percentage.clamp(0, 100) as usize * width) / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

pub fn render_goal(label: &str, progress: &GoalProgress, palette: &Palette) -> String {
    let style = if progress.is_met() {
        palette.good
    } else {
        palette.accent
    };
    format!(
        "{:<7}{} {}",
        label,
        style.paint(progress_bar(progress.percentage(), BAR_WIDTH)),
        progress
    )
}

fn share(part: Duration, total: Duration) -> i64 {
    if total <= Duration::zero() {
        0
    } else {
        part.num_minutes() * 100 / total.num_minutes().max(1)
    }
}

pub fn render_timeline<Tz: TimeZone>(
    timeline: &DailyTimeline,
    tz: &Tz,
    goal: Option<&GoalProgress>,
    palette: &Palette,
) -> String
where
    Tz::Offset: Display,
{
    let mut lines = vec![palette
        .heading
        .paint(timeline.day.format("%A %Y-%m-%d").to_string())
        .to_string()];

    if timeline.segments.is_empty() {
        lines.push(palette.muted.paint("No activity yet").to_string());
    }
    for segment in &timeline.segments {
        let mut line = format!(
            "{}-{}  {}  {:<14}",
            local_time(segment.start, tz),
            local_time(segment.end, tz),
            palette
                .status(segment.status)
                .paint(format!("{:<7}", segment.status.to_string())),
            human_duration(segment.duration()),
        );
        if let Some(tag) = &segment.tag {
            line.push_str(&format!(" {}", palette.accent.paint(tag)));
        }
        if let Some(note) = &segment.note {
            line.push_str(&format!(" {}", palette.muted.paint(format!("({note})"))));
        }
        lines.push(line.trim_end().to_string());
    }

    lines.push(format!(
        "Working {}, idle {}",
        human_duration(timeline.working),
        human_duration(timeline.idle)
    ));
    if let Some(goal) = goal {
        lines.push(render_goal("Goal", goal, palette));
    }
    lines.join("\n")
}

pub fn render_period(report: &PeriodReport, palette: &Palette) -> String {
    let title = match report.period {
        Period::Week => format!("Week of {}", report.start.format("%Y-%m-%d")),
        Period::Month => report.start.format("%B %Y").to_string(),
        Period::Year => report.start.format("%Y").to_string(),
    };
    let mut lines = vec![palette.heading.paint(title).to_string()];

    for row in &report.rows {
        let label = match report.period {
            Period::Week | Period::Month => row.start.format("%a %Y-%m-%d").to_string(),
            Period::Year => row.start.format("%b").to_string(),
        };
        let amount = if row.working > Duration::zero() {
            palette.working.paint(human_duration(row.working)).to_string()
        } else {
            palette.muted.paint("-").to_string()
        };
        lines.push(format!("{label:<15}{amount}"));
    }

    lines.push(format!("{:<15}{}", "Total", human_duration(report.total)));
    if let Some(goal) = &report.goal {
        lines.push(render_goal("Goal", goal, palette));
    }
    lines.join("\n")
}

fn day_mark(day: &DaySummary) -> char {
    if day.goal_met {
        '#'
    } else if day.working > Duration::zero() {
        '+'
    } else {
        '.'
    }
}

/// Tags as rows, day/week/month as columns. Tags are alphabetical with the untagged row last.
pub fn render_tag_table(
    day: &BTreeMap<String, Duration>,
    week: &BTreeMap<String, Duration>,
    month: &BTreeMap<String, Duration>,
    palette: &Palette,
) -> Vec<String> {
    let tags = ordered_tags([day, week, month]);
    if tags.is_empty() {
        return vec![palette.muted.paint("No tagged time").to_string()];
    }
    let cell = |map: &BTreeMap<String, Duration>, tag: &str| {
        map.get(tag)
            .map(|v| human_duration(*v))
            .unwrap_or_else(|| "-".to_string())
    };
    let width = tags.iter().map(|v| v.chars().count()).max().unwrap_or(0) + 2;

    let mut lines = vec![format!(
        "{:<width$}{:<16}{:<16}{}",
        "", "Day", "Week", "Month"
    )];
    for tag in &tags {
        lines.push(format!(
            "{}{:<16}{:<16}{}",
            palette.accent.paint(format!("{tag:<width$}")),
            cell(day, tag),
            cell(week, tag),
            cell(month, tag)
        ));
    }
    lines
}

pub fn render_summary(summary: &Summary, palette: &Palette) -> String {
    let today = &summary.today;
    let mut lines = vec![
        palette
            .heading
            .paint(format!("Today {}", today.day.format("%A %Y-%m-%d")))
            .to_string(),
        format!(
            "{} {} ({}%)   {} {} ({}%)",
            palette.status(Status::Working).paint("Working"),
            human_duration(today.working),
            share(today.working, today.total()),
            palette.status(Status::Idle).paint("Idle"),
            human_duration(today.idle),
            share(today.idle, today.total()),
        ),
    ];
    if let Some(goal) = &summary.daily_goal {
        lines.push(render_goal("Goal", goal, palette));
    }
    lines.push(format!(
        "Focus  longest {}, {} context switches",
        human_duration(summary.focus.longest_focus),
        summary.focus.context_switches
    ));

    lines.push(String::new());
    lines.push(palette.heading.paint("Progress").to_string());
    lines.push(render_goal("Week", &summary.progress.week, palette));
    lines.push(render_goal("Month", &summary.progress.month, palette));
    lines.push(render_goal("Year", &summary.progress.year, palette));

    lines.push(String::new());
    match &summary.best_worst {
        Some(v) => {
            lines.push(format!(
                "Best day   {} {}",
                v.best.0.format("%a %Y-%m-%d"),
                palette.good.paint(human_duration(v.best.1))
            ));
            lines.push(format!(
                "Worst day  {} {}",
                v.worst.0.format("%a %Y-%m-%d"),
                palette.bad.paint(human_duration(v.worst.1))
            ));
        }
        None => lines.push(
            palette
                .muted
                .paint(format!("No worked days in the last {} days", summary.month_grid.len()))
                .to_string(),
        ),
    }

    lines.push(String::new());
    lines.push(palette.heading.paint("Last 7 days").to_string());
    for day in &summary.last_week {
        let style = if day.workday {
            palette.working
        } else {
            palette.muted
        };
        lines.push(format!(
            "{}  {:<14}{}",
            day.date.format("%a %m-%d"),
            style.paint(human_duration(day.working)).to_string(),
            if day.goal_met { "goal met" } else { "" }
        )
        .trim_end()
        .to_string());
    }

    lines.push(String::new());
    lines.push(
        palette
            .heading
            .paint(format!("Last {} days", summary.month_grid.len()))
            .to_string(),
    );
    let grid = summary
        .month_grid
        .iter()
        .map(|v| match day_mark(v) {
            '#' => palette.good.paint("#").to_string(),
            '+' => palette.working.paint("+").to_string(),
            other => palette.muted.paint(other.to_string()).to_string(),
        })
        .collect::<String>();
    lines.push(grid);
    lines.push(palette.muted.paint("# goal met  + worked  . nothing").to_string());

    lines.push(String::new());
    lines.push(palette.heading.paint("Tags").to_string());
    lines.extend(render_tag_table(
        &summary.tags.day,
        &summary.tags.week,
        &summary.tags.month,
        palette,
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use crate::{
        cli::{palette::Palette, summary::collect_summary},
        query::{
            goal::GoalProgress,
            periods::{period_report, Period},
            tags::UNTAGGED,
            timeline::daily_timeline,
        },
        store::{Range, Status, Store},
    };

    use super::{progress_bar, render_period, render_summary, render_tag_table, render_timeline};

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(), NaiveTime::MIN);

    fn minute(m: i64) -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START_DATE) + Duration::minutes(m)
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 4), "[....]");
        assert_eq!(progress_bar(50, 4), "[##..]");
        assert_eq!(progress_bar(250, 4), "[####]");
    }

    #[test]
    fn test_render_timeline() {
        let mut store = Store::default();
        store.append_range(
            Range::aligned(minute(60), minute(120), Status::Working).with_tag("writing"),
        );
        store.annotate_span(minute(60), minute(120), Status::Working, "draft");
        let now = minute(122);
        let timeline = daily_timeline(&store, &now, &now);
        let goal = GoalProgress::new(timeline.working, Duration::hours(8));

        let text = render_timeline(&timeline, &Utc, Some(&goal), &Palette::plain());
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "Friday 2024-04-05",
                "00:00-01:00  idle     1 hr",
                format!("01:00-02:00  working  {:<14} writing (draft)", "1 hr").as_str(),
                "Working 1 hr, idle 1 hr",
                format!("Goal   {} 12% of 8 hrs", progress_bar(12, 20)).as_str(),
            ]
        );
    }

    #[test]
    fn test_render_year_uses_month_names() {
        let mut store = Store::default();
        store.append_range(Range::aligned(minute(0), minute(90), Status::Working));
        let report = period_report(&store, Period::Year, &minute(600));

        let text = render_period(&report, &Palette::plain());
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "2024");
        assert_eq!(lines[1], format!("{:<15}-", "Jan"));
        assert_eq!(lines[4], format!("{:<15}1 hr 30 mins", "Apr"));
        assert_eq!(lines[12], format!("{:<15}-", "Dec"));
        assert_eq!(lines[13], format!("{:<15}1 hr 30 mins", "Total"));
    }

    #[test]
    fn test_tag_table_puts_untagged_last() {
        let day = BTreeMap::from([
            (UNTAGGED.to_string(), Duration::minutes(5)),
            ("zeta".to_string(), Duration::hours(1)),
        ]);
        let week = BTreeMap::from([("alpha".to_string(), Duration::hours(2))]);
        let lines = render_tag_table(&day, &week, &BTreeMap::new(), &Palette::plain());

        let tags = lines[1..]
            .iter()
            .map(|v| v.split_whitespace().next().unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(tags, vec!["alpha", "zeta", UNTAGGED]);
        assert!(lines[1].contains("2 hrs"));
    }

    #[test]
    fn test_render_summary_sections() {
        let mut store = Store::default();
        store.append_range(
            Range::aligned(minute(-24 * 60), minute(-16 * 60), Status::Working).with_tag("ops"),
        );
        store.upsert_sample(minute(60), true);
        let summary = collect_summary(&store, &minute(120));

        let text = render_summary(&summary, &Palette::plain());
        assert!(text.starts_with("Today Friday 2024-04-05"));
        assert!(text.contains("Working 5 mins (4%)   Idle 1 hr 55 mins (95%)"));
        assert!(text.contains("Best day   Thu 2024-04-04 8 hrs"));
        assert!(text.contains("Worst day  Fri 2024-04-05 5 mins"));
        assert!(text.contains(&format!("Thu 04-04  {:<14}goal met", "8 hrs")));
        assert!(text.contains(&format!("{}#+", ".".repeat(28))));
        assert!(text.lines().last().unwrap_or_default().starts_with(UNTAGGED));
    }
}
