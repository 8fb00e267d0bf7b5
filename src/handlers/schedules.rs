use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::core::scheduler::{generate_events_for_window, reconcile_events};
use crate::core::time::local_now;
use crate::error::{AppError, AppResult};
use crate::models::schedule::{CreateScheduleRequest, Schedule, UpdateScheduleRequest};
use crate::models::user::User;
use crate::AppState;

pub async fn get_schedule(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Option<Schedule>>> {
    state
        .store
        .get_user(user_id)
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(state.store.schedule_for_user(user_id).await))
}

pub async fn create_schedule(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<CreateScheduleRequest>,
) -> AppResult<(StatusCode, Json<Schedule>)> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = state
        .store
        .get_user(user_id)
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    let now = Utc::now();
    let schedule = Schedule {
        id: Uuid::new_v4(),
        user_id,
        name: body.name,
        days_of_week: body.days_of_week,
        start_time: body.start_time,
        end_time: body.end_time,
        num_pings: body.num_pings,
        quiet_periods: body.quiet_periods,
        is_active: body.is_active,
        created_at: now,
        updated_at: now,
    };

    // One schedule per user: creation supersedes whatever was there.
    state
        .store
        .replace_schedule_for_user(user_id, schedule.clone())
        .await;
    regenerate_events(&state, &user, &schedule, now).await;

    tracing::info!(user_id = %user_id, schedule_id = %schedule.id, "Created schedule");
    Ok((StatusCode::CREATED, Json(schedule)))
}

pub async fn update_schedule(
    State(state): State<AppState>,
    Path((user_id, schedule_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateScheduleRequest>,
) -> AppResult<Json<Schedule>> {
    let user = state
        .store
        .get_user(user_id)
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    let mut schedule = state
        .store
        .get_schedule(schedule_id)
        .await
        .filter(|s| s.user_id == user_id)
        .ok_or(AppError::NotFound("Schedule not found".into()))?;

    if let Some(days) = &body.days_of_week {
        if days.iter().any(|d| *d > 6) {
            return Err(AppError::Validation(
                "days_of_week entries must be 0-6".into(),
            ));
        }
    }
    if let Some(num_pings) = body.num_pings {
        if !(1..=48).contains(&num_pings) {
            return Err(AppError::Validation(
                "num_pings must be between 1 and 48".into(),
            ));
        }
    }

    let now = Utc::now();
    if let Some(name) = body.name {
        schedule.name = name;
    }
    if let Some(days) = body.days_of_week {
        schedule.days_of_week = days;
    }
    if let Some(start_time) = body.start_time {
        schedule.start_time = start_time;
    }
    if let Some(end_time) = body.end_time {
        schedule.end_time = end_time;
    }
    if let Some(num_pings) = body.num_pings {
        schedule.num_pings = num_pings;
    }
    if let Some(quiet_periods) = body.quiet_periods {
        schedule.quiet_periods = quiet_periods;
    }
    if let Some(is_active) = body.is_active {
        schedule.is_active = is_active;
    }
    schedule.updated_at = now;

    state.store.put_schedule(schedule.clone()).await;
    regenerate_events(&state, &user, &schedule, now).await;

    tracing::info!(schedule_id = %schedule.id, "Updated schedule");
    Ok(Json(schedule))
}

/// Rebuild the user's forward event window, merging against existing
/// events so recorded outcomes and past history survive the edit.
async fn regenerate_events(
    state: &AppState,
    user: &User,
    schedule: &Schedule,
    now: DateTime<Utc>,
) {
    let fresh =
        generate_events_for_window(schedule, &user.timezone, state.config.event_window_days, now);
    let existing = state.store.events_for_user(user.id).await;
    let (today, _) = local_now(now, &user.timezone);
    let merged = reconcile_events(&existing, fresh, today);
    state.store.replace_events_for_user(user.id, merged).await;
}
