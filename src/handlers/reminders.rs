use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::scheduler::next_scheduled_event;
use crate::core::stats::{compute_streaks, sort_events_chronologically};
use crate::core::time::local_now;
use crate::error::{AppError, AppResult};
use crate::models::event::{ReminderEvent, UpdateReminderRequest};
use crate::models::user::User;
use crate::AppState;

pub async fn list_reminders(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<ReminderEvent>>> {
    state
        .store
        .get_user(user_id)
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    let mut events = state.store.events_for_user(user_id).await;
    sort_events_chronologically(&mut events);
    Ok(Json(events))
}

pub async fn next_reminder(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Option<ReminderEvent>>> {
    let user = state
        .store
        .get_user(user_id)
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    let events = state.store.events_for_user(user_id).await;
    let (today, minutes) = local_now(Utc::now(), &user.timezone);
    Ok(Json(next_scheduled_event(&events, today, minutes).cloned()))
}

/// Record a reminder outcome. The transition happens exactly once:
/// an event that is already `drank` or `skipped` conflicts.
pub async fn update_reminder(
    State(state): State<AppState>,
    Path((user_id, event_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateReminderRequest>,
) -> AppResult<Json<ReminderEvent>> {
    if !body.status.is_terminal() {
        return Err(AppError::Validation(
            "Status must be 'drank' or 'skipped'".into(),
        ));
    }

    let user = state
        .store
        .get_user(user_id)
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    let event = state
        .store
        .get_event(event_id)
        .await
        .filter(|e| e.user_id == user_id)
        .ok_or(AppError::NotFound("Reminder not found".into()))?;

    if event.status.is_terminal() {
        return Err(AppError::Conflict(
            "Reminder outcome already recorded".into(),
        ));
    }

    let now = Utc::now();
    let updated = state
        .store
        .update_event(event_id, |e| {
            e.status = body.status;
            e.updated_at = now;
        })
        .await
        .ok_or(AppError::NotFound("Reminder not found".into()))?;

    refresh_user_streaks(&state, &user, now).await;

    Ok(Json(updated))
}

/// Bulk reset: every recorded outcome goes back to `scheduled` and the
/// denormalized streak counters are zeroed with it.
pub async fn clear_history(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state
        .store
        .get_user(user_id)
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    let now = Utc::now();
    let cleared = state.store.clear_history(user_id, now).await;
    state
        .store
        .update_user(user_id, |u| {
            u.current_streak = 0;
            u.longest_streak = 0;
            u.updated_at = now;
        })
        .await;

    tracing::info!(user_id = %user_id, cleared = cleared, "Cleared reminder history");
    Ok(Json(json!({ "cleared": cleared })))
}

/// Keep the user's stored streak counters in step with the derived
/// statistics after an outcome change.
async fn refresh_user_streaks(state: &AppState, user: &User, now: DateTime<Utc>) {
    let events = state.store.events_for_user(user.id).await;
    let streaks = compute_streaks(&events, &user.timezone, now, state.config.streak_threshold);
    state
        .store
        .update_user(user.id, |u| {
            u.current_streak = streaks.current_streak as i32;
            u.longest_streak = u.longest_streak.max(streaks.best_streak as i32);
            u.updated_at = now;
        })
        .await;
}
