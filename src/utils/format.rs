use chrono::Duration;

/// Formats whole minutes the way reports print them: "1 hr", "7 hrs", "2 hr 15 mins", "1 min".
pub fn human_minutes(minutes: i64) -> String {
    let hours = minutes / 60;
    let minutes = minutes % 60;
    match (hours, minutes) {
        (h, m) if h > 0 && m > 0 => format!("{h} hr {m} mins"),
        (1, _) => "1 hr".to_string(),
        (h, _) if h > 0 => format!("{h} hrs"),
        (_, 1) => "1 min".to_string(),
        (_, m) => format!("{m} mins"),
    }
}

pub fn human_duration(duration: Duration) -> String {
    human_minutes(duration.num_minutes())
}
