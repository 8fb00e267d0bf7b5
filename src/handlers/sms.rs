use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::user::{Tier, User};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdatePhoneRequest {
    pub phone: String,
}

/// SMS reminders are a pro feature; both routes gate on the tier.
pub async fn update_phone(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdatePhoneRequest>,
) -> AppResult<Json<User>> {
    let phone = body.phone.trim().to_string();
    if phone.is_empty() {
        return Err(AppError::Validation("Phone number is required".into()));
    }

    let user = state
        .store
        .get_user(user_id)
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    if user.tier != Tier::Pro {
        return Err(AppError::Forbidden);
    }

    let updated = state
        .store
        .update_user(user_id, |u| {
            u.phone = Some(phone);
            u.updated_at = Utc::now();
        })
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    tracing::info!(user_id = %user_id, "Updated phone number");
    Ok(Json(updated))
}

pub async fn send_test_message(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let user = state
        .store
        .get_user(user_id)
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    if user.tier != Tier::Pro {
        return Err(AppError::Forbidden);
    }

    let phone = user
        .phone
        .as_deref()
        .ok_or(AppError::Validation("User has no phone number on file".into()))?;

    state
        .sms
        .send(phone, "This is a test message from Hydration Habit Ping! 💧")
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to send test SMS: {}", e)))?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Test message sent to {phone}"),
    })))
}
