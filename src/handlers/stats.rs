use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::core::stats::{build_daily_stats, compute_streaks, DailyStat, StreakSummary};
use crate::error::{AppError, AppResult};
use crate::AppState;

pub async fn get_daily_stats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<DailyStat>>> {
    state
        .store
        .get_user(user_id)
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    let events = state.store.events_for_user(user_id).await;
    let stats = build_daily_stats(&events).into_values().collect();
    Ok(Json(stats))
}

pub async fn get_streaks(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<StreakSummary>> {
    let user = state
        .store
        .get_user(user_id)
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    let events = state.store.events_for_user(user_id).await;
    let streaks = compute_streaks(
        &events,
        &user.timezone,
        Utc::now(),
        state.config.streak_threshold,
    );
    Ok(Json(streaks))
}
