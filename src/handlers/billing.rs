use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::user::Tier;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub user_id: Uuid,
    pub price_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(body): Json<CreateCheckoutRequest>,
) -> AppResult<Json<CheckoutResponse>> {
    if state.config.stripe_secret_key.is_empty() {
        return Err(AppError::Internal(anyhow::anyhow!("Stripe not configured")));
    }

    let user = state
        .store
        .get_user(body.user_id)
        .await
        .ok_or(AppError::NotFound("User not found".into()))?;

    let app_user_id = user.id.to_string();
    let customer_id = if let Some(cid) = &user.stripe_customer_id {
        cid.clone()
    } else {
        let client = reqwest::Client::new();
        let resp = client
            .post("https://api.stripe.com/v1/customers")
            .header(
                "Authorization",
                format!("Bearer {}", state.config.stripe_secret_key),
            )
            .form(&[
                ("email", user.email.as_str()),
                ("metadata[app_user_id]", app_user_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Stripe error: {}", e)))?;

        let customer: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Stripe parse error: {}", e)))?;

        let cid = customer["id"]
            .as_str()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("No customer ID from Stripe")))?
            .to_string();

        state
            .store
            .update_user(user.id, |u| {
                u.stripe_customer_id = Some(cid.clone());
                u.updated_at = Utc::now();
            })
            .await;

        cid
    };

    let success_url = format!("{}/plans?success=true", state.config.frontend_url);
    let cancel_url = format!("{}/plans?cancel=true", state.config.frontend_url);
    let client = reqwest::Client::new();
    let resp = client
        .post("https://api.stripe.com/v1/checkout/sessions")
        .header(
            "Authorization",
            format!("Bearer {}", state.config.stripe_secret_key),
        )
        .form(&[
            ("customer", customer_id.as_str()),
            ("mode", "subscription"),
            ("line_items[0][price]", body.price_id.as_str()),
            ("line_items[0][quantity]", "1"),
            ("client_reference_id", app_user_id.as_str()),
            ("success_url", success_url.as_str()),
            ("cancel_url", cancel_url.as_str()),
        ])
        .send()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stripe error: {}", e)))?;

    let session: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stripe parse error: {}", e)))?;

    let url = session["url"]
        .as_str()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("No checkout URL from Stripe")))?
        .to_string();

    Ok(Json(CheckoutResponse { url }))
}

/// Verify a Stripe webhook signature.
/// Header format: t=timestamp,v1=signature[,v1=signature...]
fn verify_stripe_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
) -> Result<(), AppError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        let mut kv = part.splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(ts)) => timestamp = Some(ts),
            (Some("v1"), Some(sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let ts = timestamp
        .ok_or_else(|| AppError::Validation("Missing timestamp in Stripe-Signature".into()))?;

    if signatures.is_empty() {
        return Err(AppError::Validation(
            "Missing v1 signature in Stripe-Signature".into(),
        ));
    }

    let signed_payload = format!("{}.{}", ts, String::from_utf8_lossy(payload));

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid webhook secret")))?;
    mac.update(signed_payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    // Constant-time comparison against every provided v1 signature.
    let valid = signatures.iter().any(|sig| {
        sig.len() == expected.len()
            && sig
                .as_bytes()
                .iter()
                .zip(expected.as_bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    });

    if !valid {
        return Err(AppError::Validation(
            "Invalid Stripe webhook signature".into(),
        ));
    }

    if let Ok(ts_secs) = ts.parse::<i64>() {
        let now = Utc::now().timestamp();
        let tolerance = 300; // 5 minutes
        if (now - ts_secs).abs() > tolerance {
            return Err(AppError::Validation(
                "Stripe webhook timestamp outside tolerance".into(),
            ));
        }
    }

    Ok(())
}

pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    if !state.config.stripe_webhook_secret.is_empty() {
        let sig_header = headers
            .get("stripe-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Validation("Missing Stripe-Signature header".into()))?;

        verify_stripe_signature(&body, sig_header, &state.config.stripe_webhook_secret)?;
    } else {
        tracing::warn!("Stripe webhook secret not configured, skipping signature verification");
    }

    let event: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {}", e)))?;

    let event_id = event["id"].as_str().unwrap_or("");
    let event_type = event["type"].as_str().unwrap_or("");

    if !event_id.is_empty() && !state.store.mark_stripe_event(event_id).await {
        tracing::debug!(event_id = event_id, "Stripe event already processed, skipping");
        return Ok(Json(serde_json::json!({ "received": true, "duplicate": true })));
    }

    tracing::info!(event_type = event_type, event_id = event_id, "Stripe webhook received");

    let now = Utc::now();
    match event_type {
        "checkout.session.completed" => {
            let object = &event["data"]["object"];
            let customer_id = object["customer"].as_str().unwrap_or("").to_string();
            let user_id = object["client_reference_id"]
                .as_str()
                .and_then(|s| s.parse::<Uuid>().ok());

            match user_id {
                Some(user_id) => {
                    let updated = state
                        .store
                        .update_user(user_id, |u| {
                            u.tier = Tier::Pro;
                            if !customer_id.is_empty() {
                                u.stripe_customer_id = Some(customer_id.clone());
                            }
                            u.updated_at = now;
                        })
                        .await;
                    match updated {
                        Some(_) => tracing::info!(user_id = %user_id, "User upgraded to pro"),
                        None => tracing::warn!(user_id = %user_id, "Checkout completed for unknown user"),
                    }
                }
                None => {
                    tracing::warn!("Checkout session missing client_reference_id");
                }
            }
        }
        "customer.subscription.updated" | "customer.subscription.deleted" => {
            let object = &event["data"]["object"];
            let customer_id = object["customer"].as_str().unwrap_or("");
            let active = event_type == "customer.subscription.updated"
                && object["status"].as_str() == Some("active");

            if let Some(user) = state.store.find_user_by_stripe_customer(customer_id).await {
                let tier = if active { Tier::Pro } else { Tier::Free };
                state
                    .store
                    .update_user(user.id, |u| {
                        u.tier = tier;
                        u.updated_at = now;
                    })
                    .await;
                tracing::info!(user_id = %user.id, tier = ?tier, "Subscription change applied");
            }
        }
        _ => {
            tracing::debug!(event_type = event_type, "Unhandled Stripe event");
        }
    }

    Ok(Json(serde_json::json!({ "received": true })))
}
