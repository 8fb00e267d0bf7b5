use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use chrono_tz::Tz;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::user::{UpdateUserRequest, User};
use crate::AppState;

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    if let Some(tz) = &body.timezone {
        if tz.parse::<Tz>().is_err() {
            return Err(AppError::Validation(format!(
                "Unknown timezone identifier: {tz}"
            )));
        }
    }
    if let Some(email) = &body.email {
        if !email.contains('@') {
            return Err(AppError::Validation("Invalid email".into()));
        }
    }

    let now = Utc::now();
    let user = state
        .store
        .update_user(user_id, |u| {
            if let Some(email) = body.email {
                u.email = email.trim().to_lowercase();
            }
            if let Some(tz) = body.timezone {
                u.timezone = tz;
            }
            u.updated_at = now;
        })
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(user))
}
