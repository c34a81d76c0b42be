use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::community::validation::trimmed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnouncementStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
    #[default]
    Announcement,
}

impl AnnouncementStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AnnouncementStatus::Planned => "planned",
            AnnouncementStatus::InProgress => "in-progress",
            AnnouncementStatus::Completed => "completed",
            AnnouncementStatus::Cancelled => "cancelled",
            AnnouncementStatus::Announcement => "announcement",
        }
    }
}

/// Row of `announcements`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub status: AnnouncementStatus,
    pub is_server_wide: bool,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Editable fields of an announcement, shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct AnnouncementDraft {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    #[serde(default)]
    pub status: AnnouncementStatus,
    #[serde(default)]
    pub is_server_wide: bool,
}

impl AnnouncementDraft {
    pub(crate) fn normalized(self) -> Self {
        Self {
            title: trimmed(&self.title),
            content: trimmed(&self.content),
            ..self
        }
    }
}

/// Row of `announcement_reads`; its existence means "read".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementRead {
    pub announcement_id: Uuid,
    pub user_id: Uuid,
}

/// Row of `announcement_comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementComment {
    pub id: Uuid,
    pub announcement_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct CommentDraft {
    #[validate(length(min = 1, max = 1000, message = "comment must be 1-1000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Sent,
    Failed,
}

/// Row of `announcement_email_queue`, drained by the email edge function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailQueueEntry {
    pub id: Uuid,
    pub announcement_id: Uuid,
    pub status: QueueStatus,
    pub created_at: DateTime<Utc>,
}
