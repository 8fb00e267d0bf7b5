use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::event::{ReminderEvent, ReminderStatus};
use crate::models::schedule::Schedule;

use super::time::{format_minutes_to_time, local_now, parse_time_to_minutes, weekday_index};

/// Upper bound on the forward generation window, matching the original
/// product's clamp.
pub const MAX_WINDOW_DAYS: i64 = 30;

/// Compute the ordered ping times for one day of a schedule.
///
/// Pings are spaced at `(end - start) / (num_pings + 1)` intervals so they
/// land strictly inside the awake window, then rounded to the nearest five
/// minutes for human-friendly times and clamped back into the window.
/// A candidate falling inside any quiet period (half-open `[start, end)`)
/// is dropped without redistribution, so quiet-heavy schedules yield fewer
/// than `num_pings` times.
pub fn compute_ping_times(schedule: &Schedule) -> Vec<String> {
    let start = parse_time_to_minutes(&schedule.start_time);
    let end = parse_time_to_minutes(&schedule.end_time);
    if end <= start || schedule.num_pings < 1 {
        return Vec::new();
    }

    let interval = (end - start) as f64 / (schedule.num_pings as f64 + 1.0);
    let quiet: Vec<(u32, u32)> = schedule
        .quiet_periods
        .iter()
        .map(|qp| (parse_time_to_minutes(&qp.start), parse_time_to_minutes(&qp.end)))
        .collect();

    let mut minutes = Vec::with_capacity(schedule.num_pings as usize);
    for i in 1..=schedule.num_pings {
        let raw = start as f64 + interval * i as f64;
        let rounded = ((raw / 5.0).round() * 5.0) as u32;
        let candidate = rounded.clamp(start, end);
        let in_quiet = quiet.iter().any(|&(qs, qe)| candidate >= qs && candidate < qe);
        if !in_quiet {
            minutes.push(candidate);
        }
    }

    // Rounding can collapse neighboring pings onto the same boundary.
    minutes.sort_unstable();
    minutes.dedup();
    minutes.into_iter().map(format_minutes_to_time).collect()
}

/// Materialize `scheduled` events for the next `num_days` calendar days
/// (today included) in the user's timezone.
///
/// Days whose weekday index is not in `days_of_week` are skipped entirely,
/// and an inactive schedule produces nothing. The ping times are
/// calendar-day-relative, so the same set applies to every active day.
pub fn generate_events_for_window(
    schedule: &Schedule,
    timezone: &str,
    num_days: i64,
    now: DateTime<Utc>,
) -> Vec<ReminderEvent> {
    if !schedule.is_active {
        return Vec::new();
    }

    let times = compute_ping_times(schedule);
    if times.is_empty() {
        return Vec::new();
    }

    let (today, _) = local_now(now, timezone);
    let mut events = Vec::new();
    for offset in 0..num_days.clamp(1, MAX_WINDOW_DAYS) {
        let date = today + Duration::days(offset);
        if !schedule.days_of_week.contains(&weekday_index(date)) {
            continue;
        }
        for time in &times {
            events.push(ReminderEvent {
                id: Uuid::new_v4(),
                schedule_id: schedule.id,
                user_id: schedule.user_id,
                date,
                time: time.clone(),
                status: ReminderStatus::Scheduled,
                created_at: now,
                updated_at: now,
            });
        }
    }
    events
}

/// Merge a freshly generated window against the existing event collection.
///
/// Events dated before `today` are history: they pass through untouched
/// and are never resurrected into the window. A fresh event whose
/// `(date, time)` key matches an existing one inherits its identity and
/// recorded outcome; existing future events with no fresh counterpart are
/// dropped.
pub fn reconcile_events(
    existing: &[ReminderEvent],
    fresh: Vec<ReminderEvent>,
    today: NaiveDate,
) -> Vec<ReminderEvent> {
    let mut merged: Vec<ReminderEvent> = existing
        .iter()
        .filter(|e| e.date < today)
        .cloned()
        .collect();

    let prior: HashMap<(NaiveDate, &str), &ReminderEvent> = existing
        .iter()
        .filter(|e| e.date >= today)
        .map(|e| ((e.date, e.time.as_str()), e))
        .collect();

    for mut event in fresh {
        if let Some(existing) = prior.get(&(event.date, event.time.as_str())) {
            event.id = existing.id;
            event.status = existing.status;
            event.created_at = existing.created_at;
            event.updated_at = existing.updated_at;
        }
        merged.push(event);
    }
    merged
}

/// First `scheduled` event at or after the current moment, if any.
pub fn next_scheduled_event<'a>(
    events: &'a [ReminderEvent],
    today: NaiveDate,
    now_minutes: u32,
) -> Option<&'a ReminderEvent> {
    events
        .iter()
        .filter(|e| e.status == ReminderStatus::Scheduled)
        .filter(|e| {
            e.date > today || (e.date == today && parse_time_to_minutes(&e.time) >= now_minutes)
        })
        .min_by_key(|e| (e.date, parse_time_to_minutes(&e.time)))
}
