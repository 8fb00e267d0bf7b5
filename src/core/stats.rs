use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::event::{ReminderEvent, ReminderStatus};

use super::time::{local_now, parse_time_to_minutes};

/// Per-day completion aggregate, always derived fresh from the event
/// history and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub total: u32,
    pub drank: u32,
    pub skipped: u32,
    /// Rounded percentage of pings marked drank; 0 for empty days.
    pub completion: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    pub current_streak: u32,
    pub best_streak: u32,
}

/// Group events by date and count outcomes.
pub fn build_daily_stats(events: &[ReminderEvent]) -> BTreeMap<NaiveDate, DailyStat> {
    let mut stats: BTreeMap<NaiveDate, DailyStat> = BTreeMap::new();
    for event in events {
        let day = stats.entry(event.date).or_insert(DailyStat {
            date: event.date,
            total: 0,
            drank: 0,
            skipped: 0,
            completion: 0,
        });
        day.total += 1;
        match event.status {
            ReminderStatus::Drank => day.drank += 1,
            ReminderStatus::Skipped => day.skipped += 1,
            ReminderStatus::Scheduled => {}
        }
    }
    for day in stats.values_mut() {
        day.completion = if day.total > 0 {
            ((day.drank as f64 / day.total as f64) * 100.0).round() as u32
        } else {
            0
        };
    }
    stats
}

/// A day counts toward a streak when at least `threshold` of its pings
/// were drank. A day with zero scheduled pings is never successful.
pub fn is_successful_day(stat: &DailyStat, threshold: f64) -> bool {
    stat.total > 0 && stat.drank as f64 / stat.total as f64 >= threshold
}

/// Current and best streaks of successful days.
///
/// The best streak is the longest run of consecutive calendar days among
/// all successful days. The current streak walks backward from today in
/// the user's timezone; a day with no events is a zero-stat day and ends
/// the walk immediately.
pub fn compute_streaks(
    events: &[ReminderEvent],
    timezone: &str,
    now: DateTime<Utc>,
    threshold: f64,
) -> StreakSummary {
    let stats = build_daily_stats(events);

    let mut best_streak = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for day in stats.values().filter(|d| is_successful_day(d, threshold)) {
        run = match prev {
            Some(p) if day.date - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        prev = Some(day.date);
        best_streak = best_streak.max(run);
    }

    let (today, _) = local_now(now, timezone);
    let mut current_streak = 0u32;
    let mut cursor = today;
    while stats
        .get(&cursor)
        .map_or(false, |d| is_successful_day(d, threshold))
    {
        current_streak += 1;
        cursor -= Duration::days(1);
    }

    StreakSummary {
        current_streak,
        best_streak,
    }
}

/// Order events by `(date, time-as-minutes)` ascending. Used anywhere
/// chronological presentation or next-event lookup is required.
pub fn sort_events_chronologically(events: &mut [ReminderEvent]) {
    events.sort_by_key(|e| (e.date, parse_time_to_minutes(&e.time)));
}
