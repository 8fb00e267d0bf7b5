use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,

    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_phone_number: String,

    /// Forward window (in days) regenerated on schedule create/edit.
    pub event_window_days: i64,
    /// Fraction of a day's pings that must be drank for it to count
    /// toward a streak.
    pub streak_threshold: f64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),

            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_else(|_| String::new()),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET")
                .unwrap_or_else(|_| String::new()),

            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_else(|_| String::new()),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_else(|_| String::new()),
            twilio_phone_number: env::var("TWILIO_PHONE_NUMBER")
                .unwrap_or_else(|_| String::new()),

            event_window_days: env::var("EVENT_WINDOW_DAYS")
                .unwrap_or_else(|_| "7".into())
                .parse()
                .unwrap_or(7),
            streak_threshold: env::var("STREAK_THRESHOLD")
                .unwrap_or_else(|_| "0.6".into())
                .parse()
                .unwrap_or(0.6),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
