use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone};
use now::DateTimeNow;

/// Local midnight of `date` in `tz`. When midnight doesn't exist because of a DST jump the first
/// valid instant after it is used.
pub fn day_start_of<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

pub fn day_start<Tz: TimeZone>(date: &DateTime<Tz>) -> DateTime<Tz> {
    day_start_of(&date.timezone(), date.date_naive())
}

/// Returns start of the next day.
pub fn next_day_start<Tz: TimeZone>(date: &DateTime<Tz>) -> DateTime<Tz> {
    let next = date.date_naive().succ_opt().unwrap_or(NaiveDate::MAX);
    day_start_of(&date.timezone(), next)
}

/// Monday of the ISO week containing `date`.
pub fn week_start<Tz: TimeZone>(date: &DateTime<Tz>) -> DateTime<Tz> {
    let monday =
        date.date_naive() - Duration::days(date.weekday().num_days_from_monday() as i64);
    day_start_of(&date.timezone(), monday)
}

pub fn month_start<Tz: TimeZone>(date: &DateTime<Tz>) -> DateTime<Tz> {
    let first = date.date_naive().with_day(1).unwrap_or(date.date_naive());
    day_start_of(&date.timezone(), first)
}

pub fn next_month_start<Tz: TimeZone>(date: &DateTime<Tz>) -> DateTime<Tz> {
    let first = date.date_naive().with_day(1).unwrap_or(date.date_naive());
    let next = first.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX);
    day_start_of(&date.timezone(), next)
}

pub fn year_start<Tz: TimeZone>(date: &DateTime<Tz>) -> DateTime<Tz> {
    date.beginning_of_year()
}

pub fn next_year_start<Tz: TimeZone>(date: &DateTime<Tz>) -> DateTime<Tz> {
    let next = NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap_or(NaiveDate::MAX);
    day_start_of(&date.timezone(), next)
}

/// Days from `start` (inclusive) to `end` (exclusive).
pub fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |v| *v < end)
}

/// ISO weekday ordinal, 1 for Monday through 7 for Sunday.
pub fn weekday_ordinal(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}
