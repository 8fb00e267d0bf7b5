//! Minute-tick SMS dispatch.
//!
//! Every 60 seconds, scan pro users with a phone number on file and send
//! one text for any reminder that is due at the current minute in the
//! user's timezone. Delivery never mutates the event: the status stays
//! `scheduled` until the user records an outcome.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::time::{local_now, parse_time_to_minutes, weekday_index};
use crate::models::event::ReminderStatus;
use crate::models::user::Tier;
use crate::services::sms::SmsSender;
use crate::store::MemoryStore;

pub fn spawn_pinger_worker(store: MemoryStore, sms: Arc<SmsSender>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            let now = Utc::now();
            let sent = dispatch_due_reminders(&store, &sms, now).await;
            if sent > 0 {
                tracing::info!(sent = sent, "Dispatched hydration pings");
            }
        }
    });
}

/// One dispatch pass at the supplied instant. Returns how many messages
/// were handed to the sender.
pub async fn dispatch_due_reminders(
    store: &MemoryStore,
    sms: &SmsSender,
    now: DateTime<Utc>,
) -> usize {
    let mut sent = 0;
    for user in store.users_snapshot().await {
        if user.tier != Tier::Pro {
            continue;
        }
        let Some(phone) = user.phone.as_deref() else {
            continue;
        };
        let Some(schedule) = store.schedule_for_user(user.id).await else {
            continue;
        };
        if !schedule.is_active {
            continue;
        }

        let (today, minutes) = local_now(now, &user.timezone);
        if !schedule.days_of_week.contains(&weekday_index(today)) {
            continue;
        }

        let events = store.events_for_user(user.id).await;
        let due = events.iter().find(|e| {
            e.date == today
                && e.status == ReminderStatus::Scheduled
                && parse_time_to_minutes(&e.time) == minutes
        });

        if let Some(event) = due {
            let body = format!("💧 Hydration Check! It's {}. Time to drink!", event.time);
            match sms.send(phone, &body).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    tracing::warn!(user_id = %user.id, error = %e, "Failed to deliver hydration ping");
                }
            }
        }
    }
    sent
}
