use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::community::review::ReviewStatus;

pub type AbsenceStatus = ReviewStatus;

/// Single row of `team_settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSettings {
    pub id: Uuid,
    #[serde(default)]
    pub meeting_day: Option<String>,
    #[serde(default)]
    pub meeting_time: Option<String>,
    #[serde(default)]
    pub meeting_frequency: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial update; absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TeamSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 32))]
    pub meeting_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 32))]
    pub meeting_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 64))]
    pub meeting_frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Row of `team_absences`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamAbsence {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: AbsenceStatus,
    #[serde(default)]
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AbsenceRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(min = 3, max = 500, message = "reason must be 3-500 characters"))]
    pub reason: String,
}

impl AbsenceRequest {
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}
