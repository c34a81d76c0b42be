use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Privilege tier stored in `admin_users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    Admin,
    Moderator,
}

impl AdminRole {
    pub const fn label(self) -> &'static str {
        match self {
            AdminRole::Admin => "admin",
            AdminRole::Moderator => "moderator",
        }
    }

    pub const fn is_admin(self) -> bool {
        matches!(self, AdminRole::Admin)
    }

    /// Both tiers may moderate.
    pub const fn can_moderate(self) -> bool {
        matches!(self, AdminRole::Admin | AdminRole::Moderator)
    }
}

/// Row of `admin_users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub user_id: Uuid,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
}

/// Admin user enriched with the auth email, when the lookup succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUserView {
    pub user_id: Uuid,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewAdminUser {
    pub email: String,
    pub role: AdminRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
    pub is_admin: bool,
    pub is_moderator: bool,
}

/// Entry returned by the user lookup RPCs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuthUserEntry {
    pub id: Uuid,
    pub email: Option<String>,
}
