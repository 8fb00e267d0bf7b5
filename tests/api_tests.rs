//! API tests driving the real router in-process.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use hydroping_api::{build_router, config::Config, AppState};

fn test_app() -> Router {
    let config = Config {
        host: "127.0.0.1".into(),
        port: 0,
        frontend_url: "http://localhost:5173".into(),
        stripe_secret_key: String::new(),
        stripe_webhook_secret: String::new(),
        twilio_account_sid: String::new(),
        twilio_auth_token: String::new(),
        twilio_phone_number: String::new(),
        event_window_days: 7,
        streak_threshold: 0.6,
    };
    build_router(AppState::new(config))
}

async fn request(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn login(app: &Router, email: &str) -> Value {
    let (status, user) = request(app, "POST", "/api/login", Some(json!({ "email": email }))).await;
    assert_eq!(status, StatusCode::OK);
    user
}

async fn create_default_schedule(app: &Router, user_id: &str) -> Value {
    let (status, schedule) = request(
        app,
        "POST",
        &format!("/api/users/{user_id}/schedule"),
        Some(json!({
            "name": "Workday hydration",
            "days_of_week": [0, 1, 2, 3, 4, 5, 6],
            "start_time": "09:00",
            "end_time": "19:00",
            "num_pings": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    schedule
}

#[tokio::test]
async fn health_check_reports_ok() {
    let app = test_app();
    let (status, body) = request(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn login_is_idempotent_per_email() {
    let app = test_app();
    let first = login(&app, " Sipper@Example.com ").await;
    assert_eq!(first["email"], "sipper@example.com");
    assert_eq!(first["tier"], "free");
    assert_eq!(first["current_streak"], 0);

    let second = login(&app, "sipper@example.com").await;
    assert_eq!(second["id"], first["id"]);
}

#[tokio::test]
async fn login_rejects_invalid_email() {
    let app = test_app();
    let (status, _) = request(&app, "POST", "/api/login", Some(json!({ "email": "  " }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) =
        request(&app, "POST", "/api/login", Some(json!({ "email": "no-at-sign" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn creating_a_schedule_materializes_the_event_window() {
    let app = test_app();
    let user = login(&app, "sipper@example.com").await;
    let user_id = user["id"].as_str().unwrap();

    let schedule = create_default_schedule(&app, user_id).await;
    assert_eq!(schedule["num_pings"], 4);

    let (status, fetched) =
        request(&app, "GET", &format!("/api/users/{user_id}/schedule"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], schedule["id"]);

    let (status, reminders) =
        request(&app, "GET", &format!("/api/users/{user_id}/reminders"), None).await;
    assert_eq!(status, StatusCode::OK);
    let reminders = reminders.as_array().unwrap();
    // Every day of the week is active: 7 days x 4 pings.
    assert_eq!(reminders.len(), 28);
    assert!(reminders.iter().all(|e| e["status"] == "scheduled"));

    // Chronological ordering.
    let keys: Vec<(String, String)> = reminders
        .iter()
        .map(|e| {
            (
                e["date"].as_str().unwrap().to_string(),
                e["time"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    let (status, next) =
        request(&app, "GET", &format!("/api/users/{user_id}/reminders/next"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["status"], "scheduled");
}

#[tokio::test]
async fn schedule_endpoints_validate_input_and_ownership() {
    let app = test_app();
    let user = login(&app, "sipper@example.com").await;
    let user_id = user["id"].as_str().unwrap();

    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/users/{user_id}/schedule"),
        Some(json!({
            "name": "Bad",
            "days_of_week": [1, 9],
            "start_time": "09:00",
            "end_time": "19:00",
            "num_pings": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/users/{user_id}/schedule"),
        Some(json!({
            "name": "Bad",
            "days_of_week": [1],
            "start_time": "09:00",
            "end_time": "19:00",
            "num_pings": 0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = request(
        &app,
        "GET",
        "/api/users/00000000-0000-0000-0000-000000000000/schedule",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reminder_outcomes_are_recorded_exactly_once() {
    let app = test_app();
    let user = login(&app, "sipper@example.com").await;
    let user_id = user["id"].as_str().unwrap();
    create_default_schedule(&app, user_id).await;

    let (_, reminders) =
        request(&app, "GET", &format!("/api/users/{user_id}/reminders"), None).await;
    let event_id = reminders[0]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/users/{user_id}/reminders/{event_id}");
    let (status, updated) =
        request(&app, "PUT", &uri, Some(json!({ "status": "drank" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "drank");

    // A terminal outcome conflicts on re-record...
    let (status, _) = request(&app, "PUT", &uri, Some(json!({ "status": "skipped" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // ...and `scheduled` is not a recordable outcome.
    let other_id = reminders[1]["id"].as_str().unwrap();
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{user_id}/reminders/{other_id}"),
        Some(json!({ "status": "scheduled" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn editing_a_schedule_preserves_recorded_outcomes() {
    let app = test_app();
    let user = login(&app, "sipper@example.com").await;
    let user_id = user["id"].as_str().unwrap();
    let schedule = create_default_schedule(&app, user_id).await;
    let schedule_id = schedule["id"].as_str().unwrap();

    let (_, reminders) =
        request(&app, "GET", &format!("/api/users/{user_id}/reminders"), None).await;
    let target = &reminders[0];
    let event_id = target["id"].as_str().unwrap();
    let key = (target["date"].clone(), target["time"].clone());

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{user_id}/reminders/{event_id}"),
        Some(json!({ "status": "drank" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // An edit that keeps the same ping times regenerates the window.
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{user_id}/schedule/{schedule_id}"),
        Some(json!({ "name": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, after) =
        request(&app, "GET", &format!("/api/users/{user_id}/reminders"), None).await;
    let survivor = after
        .as_array()
        .unwrap()
        .iter()
        .find(|e| (e["date"].clone(), e["time"].clone()) == key)
        .expect("event at the same (date, time) key must survive");
    assert_eq!(survivor["id"].as_str().unwrap(), event_id);
    assert_eq!(survivor["status"], "drank");
}

#[tokio::test]
async fn stats_and_streaks_reflect_outcomes() {
    let app = test_app();
    let user = login(&app, "sipper@example.com").await;
    let user_id = user["id"].as_str().unwrap();
    create_default_schedule(&app, user_id).await;

    let (_, reminders) =
        request(&app, "GET", &format!("/api/users/{user_id}/reminders"), None).await;
    let reminders = reminders.as_array().unwrap();
    // The window starts today, so the first four events are today's.
    let today = reminders[0]["date"].as_str().unwrap().to_string();
    let todays: Vec<&Value> = reminders
        .iter()
        .filter(|e| e["date"] == today.as_str())
        .collect();
    assert_eq!(todays.len(), 4);

    for (i, event) in todays.iter().enumerate() {
        let outcome = if i < 3 { "drank" } else { "skipped" };
        let event_id = event["id"].as_str().unwrap();
        let (status, _) = request(
            &app,
            "PUT",
            &format!("/api/users/{user_id}/reminders/{event_id}"),
            Some(json!({ "status": outcome })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, daily) =
        request(&app, "GET", &format!("/api/users/{user_id}/stats/daily"), None).await;
    assert_eq!(status, StatusCode::OK);
    let today_stat = daily
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["date"] == today.as_str())
        .unwrap();
    assert_eq!(today_stat["total"], 4);
    assert_eq!(today_stat["drank"], 3);
    assert_eq!(today_stat["skipped"], 1);
    assert_eq!(today_stat["completion"], 75);

    // 75% >= the 0.6 threshold: today extends the streak.
    let (status, streaks) =
        request(&app, "GET", &format!("/api/users/{user_id}/stats/streaks"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(streaks["current_streak"], 1);
    assert_eq!(streaks["best_streak"], 1);

    // The denormalized counters follow the derived values.
    let refreshed = login(&app, "sipper@example.com").await;
    assert_eq!(refreshed["current_streak"], 1);
    assert_eq!(refreshed["longest_streak"], 1);
}

#[tokio::test]
async fn clearing_history_resets_outcomes_and_streaks() {
    let app = test_app();
    let user = login(&app, "sipper@example.com").await;
    let user_id = user["id"].as_str().unwrap();
    create_default_schedule(&app, user_id).await;

    let (_, reminders) =
        request(&app, "GET", &format!("/api/users/{user_id}/reminders"), None).await;
    let event_id = reminders[0]["id"].as_str().unwrap();
    request(
        &app,
        "PUT",
        &format!("/api/users/{user_id}/reminders/{event_id}"),
        Some(json!({ "status": "drank" })),
    )
    .await;

    let (status, cleared) = request(
        &app,
        "POST",
        &format!("/api/users/{user_id}/reminders/clear"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["cleared"], 1);

    let (_, after) =
        request(&app, "GET", &format!("/api/users/{user_id}/reminders"), None).await;
    assert!(after.as_array().unwrap().iter().all(|e| e["status"] == "scheduled"));

    let (_, streaks) =
        request(&app, "GET", &format!("/api/users/{user_id}/stats/streaks"), None).await;
    assert_eq!(streaks["current_streak"], 0);
    assert_eq!(streaks["best_streak"], 0);
}

#[tokio::test]
async fn webhook_upgrade_unlocks_sms_features() {
    let app = test_app();
    let user = login(&app, "sipper@example.com").await;
    let user_id = user["id"].as_str().unwrap();

    // Free tier: SMS routes are gated.
    let (status, _) = request(
        &app,
        "PATCH",
        &format!("/api/sms/user/{user_id}/phone"),
        Some(json!({ "phone": "+15551234567" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Checkout completion upgrades the user (signature check is disabled
    // in the test config, matching an unconfigured webhook secret).
    let (status, body) = request(
        &app,
        "POST",
        "/api/billing/webhook",
        Some(json!({
            "id": "evt_test_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "customer": "cus_test_123",
                "client_reference_id": user_id
            }}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    let upgraded = login(&app, "sipper@example.com").await;
    assert_eq!(upgraded["tier"], "pro");

    // Replays of the same event are acknowledged but not reprocessed.
    let (status, body) = request(
        &app,
        "POST",
        "/api/billing/webhook",
        Some(json!({
            "id": "evt_test_1",
            "type": "checkout.session.completed",
            "data": { "object": { "customer": "cus_test_123", "client_reference_id": user_id }}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duplicate"], true);

    // Pro tier: phone update and test message (mock SMS mode) succeed.
    let (status, updated) = request(
        &app,
        "PATCH",
        &format!("/api/sms/user/{user_id}/phone"),
        Some(json!({ "phone": "+15551234567" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "+15551234567");

    let (status, sent) = request(
        &app,
        "POST",
        &format!("/api/sms/user/{user_id}/send-test"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["success"], true);
}

#[tokio::test]
async fn subscription_deletion_downgrades_the_user() {
    let app = test_app();
    let user = login(&app, "sipper@example.com").await;
    let user_id = user["id"].as_str().unwrap();

    request(
        &app,
        "POST",
        "/api/billing/webhook",
        Some(json!({
            "id": "evt_up",
            "type": "checkout.session.completed",
            "data": { "object": { "customer": "cus_9", "client_reference_id": user_id }}
        })),
    )
    .await;
    assert_eq!(login(&app, "sipper@example.com").await["tier"], "pro");

    request(
        &app,
        "POST",
        "/api/billing/webhook",
        Some(json!({
            "id": "evt_down",
            "type": "customer.subscription.deleted",
            "data": { "object": { "customer": "cus_9" }}
        })),
    )
    .await;
    assert_eq!(login(&app, "sipper@example.com").await["tier"], "free");
}

#[tokio::test]
async fn user_update_validates_timezone() {
    let app = test_app();
    let user = login(&app, "sipper@example.com").await;
    let user_id = user["id"].as_str().unwrap();

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{user_id}"),
        Some(json!({ "timezone": "Not/A_Zone" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, updated) = request(
        &app,
        "PUT",
        &format!("/api/users/{user_id}"),
        Some(json!({ "timezone": "Europe/Paris" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["timezone"], "Europe/Paris");
}
