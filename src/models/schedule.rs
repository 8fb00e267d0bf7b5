use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// Weekday indices, 0=Sunday..6=Saturday. Empty means no active days.
    pub days_of_week: Vec<u8>,
    /// Wall-clock "HH:mm" strings.
    pub start_time: String,
    pub end_time: String,
    pub num_pings: i32,
    pub quiet_periods: Vec<QuietPeriod>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A `[start, end)` wall-clock range during which no ping may land.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuietPeriod {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    #[validate(length(min = 1, max = 100, message = "Schedule name must be 1-100 characters"))]
    pub name: String,

    #[validate(custom = "validate_days_of_week")]
    pub days_of_week: Vec<u8>,

    pub start_time: String,
    pub end_time: String,

    #[validate(range(min = 1, max = 48, message = "num_pings must be between 1 and 48"))]
    pub num_pings: i32,

    #[serde(default)]
    pub quiet_periods: Vec<QuietPeriod>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub name: Option<String>,
    pub days_of_week: Option<Vec<u8>>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub num_pings: Option<i32>,
    pub quiet_periods: Option<Vec<QuietPeriod>>,
    pub is_active: Option<bool>,
}

fn default_active() -> bool {
    true
}

fn validate_days_of_week(days: &Vec<u8>) -> Result<(), ValidationError> {
    if days.iter().any(|d| *d > 6) {
        return Err(ValidationError::new("days_of_week_out_of_range"));
    }
    Ok(())
}
