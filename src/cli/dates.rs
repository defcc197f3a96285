use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, TimeZone};
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

pub const DATE_EXAMPLES: &str =
    "Examples are \"yesterday\", \"10:30\", \"yesterday 14:00\", \"15/03/2025\", \"12:00 16/03/2025\"";

/// Parses a natural language moment relative to `now`, reporting failures as clap validation
/// errors.
pub fn parse_moment<Tz: TimeZone>(
    text: &str,
    now: &DateTime<Tz>,
    style: DateStyle,
) -> Result<DateTime<Tz>>
where
    Tz::Offset: Copy + Display,
{
    parse_date_string(text, now.clone(), style.into()).map_err(|e| {
        Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {text:?}: {e}"),
            )
            .into()
    })
}
