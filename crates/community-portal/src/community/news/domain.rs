use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::community::validation::{trimmed, trimmed_opt};

/// Row of `news`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct NewsDraft {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    #[serde(default)]
    #[validate(url(message = "image must be a valid URL"))]
    pub image_url: Option<String>,
}

impl NewsDraft {
    pub(crate) fn normalized(self) -> Self {
        Self {
            title: trimmed(&self.title),
            content: trimmed(&self.content),
            image_url: trimmed_opt(self.image_url),
        }
    }
}
