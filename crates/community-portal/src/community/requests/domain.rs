use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::community::review::ReviewStatus;
use crate::community::validation::{numeric_id, trimmed, trimmed_opt};

pub type RequestStatus = ReviewStatus;

/// Which linked account an ID change refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdKind {
    Discord,
    Roblox,
}

/// Row of `account_deletion_requests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDeletionRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub reason: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processed_by: Option<Uuid>,
}

/// Row of `id_change_requests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdChangeRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub id_kind: IdKind,
    pub current_id: String,
    pub requested_id: String,
    pub reason: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processed_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct DeletionForm {
    #[serde(default)]
    #[validate(length(max = 1000, message = "reason must be at most 1000 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct IdChangeForm {
    pub id_kind: IdKind,
    #[validate(custom(function = "numeric_id"))]
    pub current_id: String,
    #[validate(custom(function = "numeric_id"))]
    pub requested_id: String,
    #[validate(length(min = 3, max = 500, message = "reason must be 3-500 characters"))]
    pub reason: String,
}

impl DeletionForm {
    pub(crate) fn normalized(self) -> Self {
        Self {
            reason: trimmed_opt(self.reason),
        }
    }
}

impl IdChangeForm {
    pub(crate) fn normalized(self) -> Self {
        Self {
            id_kind: self.id_kind,
            current_id: trimmed(&self.current_id),
            requested_id: trimmed(&self.requested_id),
            reason: trimmed(&self.reason),
        }
    }
}

/// Everything the caller has asked for, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MyRequests {
    pub deletion: Vec<AccountDeletionRequest>,
    pub id_changes: Vec<IdChangeRequest>,
}
