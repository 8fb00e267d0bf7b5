use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parse an "HH:mm" wall-clock string into minutes since midnight.
///
/// Malformed input is never an error: unparsable components default to 0,
/// out-of-range hours clamp to [0,23] and minutes to [0,59].
pub fn parse_time_to_minutes(time: &str) -> u32 {
    let mut parts = time.splitn(2, ':');
    let hour = parts
        .next()
        .and_then(|p| p.trim().parse::<i32>().ok())
        .unwrap_or(0)
        .clamp(0, 23);
    let minute = parts
        .next()
        .and_then(|p| p.trim().parse::<i32>().ok())
        .unwrap_or(0)
        .clamp(0, 59);
    (hour * 60 + minute) as u32
}

/// Format minutes since midnight as "HH:mm", normalizing past-midnight
/// values back into a single day.
pub fn format_minutes_to_time(minutes: u32) -> String {
    let normalized = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", normalized / 60, normalized % 60)
}

/// Resolve an IANA timezone identifier, falling back to UTC for unknown
/// or empty values.
pub fn resolve_timezone(timezone: &str) -> Tz {
    timezone.parse().unwrap_or(Tz::UTC)
}

/// Today's calendar date and the current minute of day in the given
/// timezone, derived from an injected UTC instant.
pub fn local_now(now: DateTime<Utc>, timezone: &str) -> (NaiveDate, u32) {
    let local = now.with_timezone(&resolve_timezone(timezone));
    let minutes = local.hour() * 60 + local.minute();
    (local.date_naive(), minutes)
}

/// Weekday index with 0=Sunday..6=Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}
