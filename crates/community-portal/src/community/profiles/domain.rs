use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::community::validation::{numeric_id, trimmed_opt};

pub const AVATAR_BUCKET: &str = "avatars";
pub const AVATAR_MAX_BYTES: usize = 2 * 1024 * 1024;

/// Row of `profiles`; `id` is the auth user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub discord_id: Option<String>,
    #[serde(default)]
    pub roblox_id: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 32, message = "username must be 3-32 characters"))]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "numeric_id"))]
    pub discord_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "numeric_id"))]
    pub roblox_id: Option<String>,
}

impl ProfilePatch {
    pub(crate) fn normalized(self) -> Self {
        Self {
            username: trimmed_opt(self.username),
            discord_id: trimmed_opt(self.discord_id),
            roblox_id: trimmed_opt(self.roblox_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.discord_id.is_none() && self.roblox_id.is_none()
    }
}
