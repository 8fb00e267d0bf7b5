use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One concrete, dated reminder instance.
///
/// Events hold a weak reference to their schedule: when a schedule is
/// edited or replaced, past events stay behind as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderEvent {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub user_id: Uuid,
    /// Calendar date in the user's timezone ("YYYY-MM-DD").
    pub date: NaiveDate,
    /// Wall-clock "HH:mm" ping time.
    pub time: String,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Scheduled,
    Drank,
    Skipped,
}

impl ReminderStatus {
    /// An outcome is recorded exactly once; `drank` and `skipped` never
    /// revert outside of a bulk history clear.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Drank | Self::Skipped)
    }
}

impl Default for ReminderStatus {
    fn default() -> Self {
        Self::Scheduled
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateReminderRequest {
    pub status: ReminderStatus,
}
