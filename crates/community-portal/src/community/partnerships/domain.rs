use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::community::review::ReviewStatus;
use crate::community::validation::{alphanumeric, numeric_id, trimmed};

pub type PartnerStatus = ReviewStatus;

/// Row of `partner_applications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub server_name: String,
    pub discord_invite: String,
    pub owner_discord_id: String,
    pub member_count: u32,
    pub description: String,
    pub status: PartnerStatus,
    #[serde(default)]
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PartnerForm {
    #[validate(length(min = 2, max = 100, message = "server name must be 2-100 characters"))]
    pub server_name: String,
    /// Invite code only, without the `discord.gg/` prefix.
    #[validate(custom(function = "alphanumeric"))]
    pub discord_invite: String,
    #[validate(custom(function = "numeric_id"))]
    pub owner_discord_id: String,
    #[validate(range(min = 1, message = "member count must be at least 1"))]
    pub member_count: u32,
    #[validate(length(min = 20, max = 2000, message = "description must be 20-2000 characters"))]
    pub description: String,
}

impl PartnerForm {
    pub(crate) fn normalized(self) -> Self {
        Self {
            server_name: trimmed(&self.server_name),
            discord_invite: trimmed(&self.discord_invite),
            owner_discord_id: trimmed(&self.owner_discord_id),
            description: trimmed(&self.description),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(invite: &str) -> PartnerForm {
        PartnerForm {
            server_name: "Harbor City RP".to_string(),
            discord_invite: invite.to_string(),
            owner_discord_id: "123456789012345678".to_string(),
            member_count: 250,
            description: "A friendly roleplay server with weekly events.".to_string(),
        }
    }

    #[test]
    fn invite_with_symbols_is_rejected() {
        for invite in ["discord.gg/abc", "abc-123", "abc 123", "äbc"] {
            let errors = form(invite).validate().expect_err("invalid invite");
            assert!(errors.field_errors().contains_key("discord_invite"), "{invite}");
        }
        assert!(form("HarborCity2024").validate().is_ok());
    }

    #[test]
    fn zero_members_and_short_description_fail() {
        let mut partner = form("abc");
        partner.member_count = 0;
        partner.description = "too short".to_string();
        let errors = partner.validate().expect_err("invalid form");
        let fields = errors.field_errors();
        assert!(fields.contains_key("member_count"));
        assert!(fields.contains_key("description"));
    }
}
