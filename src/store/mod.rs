//! In-memory persistence.
//!
//! The product stores everything in process memory: maps of users,
//! schedules, and reminder events, plus the set of already-processed
//! Stripe webhook events. State is lost on restart. Guards are scoped so
//! no lock is ever held across an await point.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::event::{ReminderEvent, ReminderStatus};
use crate::models::schedule::Schedule;
use crate::models::user::User;

#[derive(Default)]
struct Inner {
    users: RwLock<HashMap<Uuid, User>>,
    schedules: RwLock<HashMap<Uuid, Schedule>>,
    events: RwLock<HashMap<Uuid, ReminderEvent>>,
    stripe_events: RwLock<HashSet<String>>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Users ---

    pub async fn insert_user(&self, user: User) {
        self.inner.users.write().await.insert(user.id, user);
    }

    pub async fn get_user(&self, id: Uuid) -> Option<User> {
        self.inner.users.read().await.get(&id).cloned()
    }

    pub async fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.inner
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    pub async fn find_user_by_stripe_customer(&self, customer_id: &str) -> Option<User> {
        self.inner
            .users
            .read()
            .await
            .values()
            .find(|u| u.stripe_customer_id.as_deref() == Some(customer_id))
            .cloned()
    }

    /// Apply a mutation to a user and return the updated record.
    pub async fn update_user<F>(&self, id: Uuid, mutate: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.inner.users.write().await;
        let user = users.get_mut(&id)?;
        mutate(user);
        Some(user.clone())
    }

    pub async fn users_snapshot(&self) -> Vec<User> {
        self.inner.users.read().await.values().cloned().collect()
    }

    // --- Schedules ---

    pub async fn schedule_for_user(&self, user_id: Uuid) -> Option<Schedule> {
        self.inner
            .schedules
            .read()
            .await
            .values()
            .find(|s| s.user_id == user_id)
            .cloned()
    }

    pub async fn get_schedule(&self, id: Uuid) -> Option<Schedule> {
        self.inner.schedules.read().await.get(&id).cloned()
    }

    /// Insert a schedule, discarding any other schedule the user had.
    /// The product keeps at most one schedule per user.
    pub async fn replace_schedule_for_user(&self, user_id: Uuid, schedule: Schedule) {
        let mut schedules = self.inner.schedules.write().await;
        schedules.retain(|_, s| s.user_id != user_id);
        schedules.insert(schedule.id, schedule);
    }

    pub async fn put_schedule(&self, schedule: Schedule) {
        self.inner.schedules.write().await.insert(schedule.id, schedule);
    }

    // --- Reminder events ---

    pub async fn events_for_user(&self, user_id: Uuid) -> Vec<ReminderEvent> {
        self.inner
            .events
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn get_event(&self, id: Uuid) -> Option<ReminderEvent> {
        self.inner.events.read().await.get(&id).cloned()
    }

    /// Swap the user's entire event collection for a reconciled one.
    pub async fn replace_events_for_user(&self, user_id: Uuid, replacement: Vec<ReminderEvent>) {
        let mut events = self.inner.events.write().await;
        events.retain(|_, e| e.user_id != user_id);
        for event in replacement {
            events.insert(event.id, event);
        }
    }

    pub async fn update_event<F>(&self, id: Uuid, mutate: F) -> Option<ReminderEvent>
    where
        F: FnOnce(&mut ReminderEvent),
    {
        let mut events = self.inner.events.write().await;
        let event = events.get_mut(&id)?;
        mutate(event);
        Some(event.clone())
    }

    /// Reset every recorded outcome for the user back to `scheduled`.
    /// Returns how many events were reset.
    pub async fn clear_history(&self, user_id: Uuid, now: DateTime<Utc>) -> usize {
        let mut events = self.inner.events.write().await;
        let mut cleared = 0;
        for event in events.values_mut() {
            if event.user_id == user_id && event.status.is_terminal() {
                event.status = ReminderStatus::Scheduled;
                event.updated_at = now;
                cleared += 1;
            }
        }
        cleared
    }

    // --- Stripe webhook dedup ---

    /// Record a Stripe event id; false means it was already processed.
    pub async fn mark_stripe_event(&self, event_id: &str) -> bool {
        self.inner
            .stripe_events
            .write()
            .await
            .insert(event_id.to_string())
    }
}
