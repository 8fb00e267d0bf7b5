use axum::{extract::State, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::user::{LoginRequest, Tier, User};
use crate::AppState;

/// Email-identified login: returns the existing user for the address or
/// creates a fresh free-tier account. There is no credential check; the
/// product treats the email itself as the identity.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<User>> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()));
    }

    if let Some(user) = state.store.find_user_by_email(&email).await {
        tracing::debug!(user_id = %user.id, "Login for existing user");
        return Ok(Json(user));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email,
        timezone: "America/Los_Angeles".into(),
        phone: None,
        tier: Tier::Free,
        stripe_customer_id: None,
        current_streak: 0,
        longest_streak: 0,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_user(user.clone()).await;
    tracing::info!(user_id = %user.id, "Created user on first login");

    Ok(Json(user))
}
