use std::fmt::Display;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, TimeZone};
use clap::Parser;
use tracing::info;

use crate::{
    query::timeline::{daily_timeline, TimelineSegment},
    store::{Store, StoreRepository},
    utils::format::human_duration,
};

use super::dates::{parse_moment, DateStyle, DATE_EXAMPLES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Tag,
    Note,
}

#[derive(Debug, Parser)]
pub struct LabelCommand {
    #[arg(
        long,
        help = format!("Moment inside the block to label, the latest block by default. {DATE_EXAMPLES}")
    )]
    at: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk)]
    date_style: DateStyle,
    /// Empty text removes the label.
    text: String,
}

/// Labels the timeline block containing `at`, or the latest block of today when `at` is
/// missing. Returns the labelled block.
pub fn label_block<Tz: TimeZone>(
    store: &mut Store,
    kind: LabelKind,
    at: Option<&DateTime<Tz>>,
    now: &DateTime<Tz>,
    text: &str,
) -> Result<TimelineSegment> {
    let timeline = daily_timeline(store, at.unwrap_or(now), now);
    let segment = match at {
        Some(at) => timeline.segment_at(at.to_utc()),
        None => timeline.segments.last(),
    }
    .cloned()
    .ok_or_else(|| anyhow!("No activity block to label on {}", timeline.day))?;

    let tz = now.timezone();
    let (start, end) = (
        segment.start.with_timezone(&tz),
        segment.end.with_timezone(&tz),
    );
    match kind {
        LabelKind::Tag => store.tag_span(start, end, segment.status, text),
        LabelKind::Note => store.annotate_span(start, end, segment.status, text),
    };
    Ok(segment)
}

pub async fn process_label_command(
    LabelCommand {
        at,
        date_style,
        text,
    }: LabelCommand,
    kind: LabelKind,
    repository: impl StoreRepository,
) -> Result<()> {
    let now = Local::now();
    let at = at
        .map(|v| parse_moment(&v, &now, date_style))
        .transpose()?;

    let mut store = repository.load().await?;
    let segment = label_block(&mut store, kind, at.as_ref(), &now, &text)?;
    repository.save(&store).await?;

    info!("Labelled block {}..{}", segment.start, segment.end);
    println!(
        "Labelled {} {} block {}-{}",
        human_duration(segment.duration()),
        segment.status,
        local_time(&segment.start.with_timezone(&Local)),
        local_time(&segment.end.with_timezone(&Local)),
    );
    Ok(())
}

fn local_time<Tz: TimeZone>(moment: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    moment.format("%H:%M").to_string()
}

/// Prints the tag catalogue, one per line.
pub async fn process_tags_command(repository: impl StoreRepository) -> Result<()> {
    let store = repository.load().await?;
    for tag in store.tags() {
        println!("{tag}");
    }
    Ok(())
}
