use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod core;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

use config::Config;
use services::sms::SmsSender;
use store::MemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: MemoryStore,
    pub config: Arc<Config>,
    pub sms: Arc<SmsSender>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let sms = Arc::new(SmsSender::from_config(&config));
        Self {
            store: MemoryStore::new(),
            config: Arc::new(config),
            sms,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![state
            .config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .expect("FRONTEND_URL must be a valid origin")];
        // In dev, also allow LAN access (e.g. testing from another device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        // Auth (mock, email-identified)
        .route("/api/login", post(handlers::auth::login))
        // Users
        .route("/api/users/:user_id", put(handlers::users::update_user))
        // Schedule
        .route(
            "/api/users/:user_id/schedule",
            get(handlers::schedules::get_schedule).post(handlers::schedules::create_schedule),
        )
        .route(
            "/api/users/:user_id/schedule/:schedule_id",
            put(handlers::schedules::update_schedule),
        )
        // Reminders
        .route(
            "/api/users/:user_id/reminders",
            get(handlers::reminders::list_reminders),
        )
        .route(
            "/api/users/:user_id/reminders/next",
            get(handlers::reminders::next_reminder),
        )
        .route(
            "/api/users/:user_id/reminders/clear",
            post(handlers::reminders::clear_history),
        )
        .route(
            "/api/users/:user_id/reminders/:event_id",
            put(handlers::reminders::update_reminder),
        )
        // Stats & streaks
        .route(
            "/api/users/:user_id/stats/daily",
            get(handlers::stats::get_daily_stats),
        )
        .route(
            "/api/users/:user_id/stats/streaks",
            get(handlers::stats::get_streaks),
        )
        // Billing
        .route(
            "/api/billing/create-checkout-session",
            post(handlers::billing::create_checkout_session),
        )
        .route("/api/billing/webhook", post(handlers::billing::stripe_webhook))
        // SMS
        .route("/api/sms/user/:user_id/phone", patch(handlers::sms::update_phone))
        .route(
            "/api/sms/user/:user_id/send-test",
            post(handlers::sms::send_test_message),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
