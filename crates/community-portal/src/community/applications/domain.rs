use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::community::review::ReviewStatus;
use crate::community::validation::{trimmed, trimmed_opt};
use crate::community::{FieldError, ValidationFailure};

/// Ages below this need an explicit confirmation in step one.
pub const CONFIRMATION_AGE: u8 = 14;
/// Ages below this are flagged `is_under12`.
pub const UNDER12_AGE: u8 = 12;

pub type ApplicationStatus = ReviewStatus;

/// Step one: identity and activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BasicInfo {
    #[validate(length(min = 1, message = "Discord ID is required"))]
    pub discord_id: String,
    #[validate(length(min = 1, message = "Roblox ID is required"))]
    pub roblox_id: String,
    #[validate(length(min = 1, message = "Roblox username is required"))]
    pub roblox_username: String,
    #[validate(range(min = 1, max = 120, message = "age must be between 1 and 120"))]
    pub age: u8,
    #[validate(range(min = 1, max = 5, message = "activity level must be between 1 and 5"))]
    pub activity_level: u8,
    #[serde(default)]
    pub other_servers: Option<String>,
}

impl BasicInfo {
    pub(crate) fn normalized(self) -> Self {
        Self {
            discord_id: trimmed(&self.discord_id),
            roblox_id: trimmed(&self.roblox_id),
            roblox_username: trimmed(&self.roblox_username),
            other_servers: trimmed_opt(self.other_servers),
            ..self
        }
    }

    pub fn needs_age_confirmation(&self) -> bool {
        self.age < CONFIRMATION_AGE
    }

    pub fn is_under12(&self) -> bool {
        self.age < UNDER12_AGE
    }
}

/// Step two: free-text answers about the server rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RulesUnderstanding {
    #[validate(length(min = 30, message = "please answer in at least 30 characters"))]
    pub frp_understanding: String,
    #[validate(length(min = 30, message = "please answer in at least 30 characters"))]
    pub vdm_understanding: String,
    #[validate(length(min = 30, message = "please answer in at least 30 characters"))]
    pub taschen_rp_understanding: String,
    #[validate(length(min = 30, message = "please answer in at least 30 characters"))]
    pub server_age_understanding: String,
}

impl RulesUnderstanding {
    pub(crate) fn normalized(self) -> Self {
        Self {
            frp_understanding: trimmed(&self.frp_understanding),
            vdm_understanding: trimmed(&self.vdm_understanding),
            taschen_rp_understanding: trimmed(&self.taschen_rp_understanding),
            server_age_understanding: trimmed(&self.server_age_understanding),
        }
    }
}

/// Step three: scenario answers and the terms checkbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Situation {
    #[validate(length(min = 30, message = "please answer in at least 30 characters"))]
    pub situation_handling: String,
    #[validate(length(min = 30, message = "please answer in at least 30 characters"))]
    pub bodycam_understanding: String,
    #[validate(length(min = 30, message = "please answer in at least 30 characters"))]
    pub friend_rule_violation: String,
    #[serde(default)]
    pub admin_experience: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub accept_terms: bool,
}

impl Situation {
    pub(crate) fn normalized(self) -> Self {
        Self {
            situation_handling: trimmed(&self.situation_handling),
            bodycam_understanding: trimmed(&self.bodycam_understanding),
            friend_rule_violation: trimmed(&self.friend_rule_violation),
            admin_experience: trimmed_opt(self.admin_experience),
            notes: trimmed_opt(self.notes),
            ..self
        }
    }

    /// Field validation plus the terms checkbox.
    pub fn check(&self) -> Result<(), ValidationFailure> {
        let mut failure = match self.validate() {
            Ok(()) => ValidationFailure { errors: Vec::new() },
            Err(errors) => ValidationFailure::from(errors),
        };
        if !self.accept_terms {
            failure.errors.push(FieldError {
                field: "accept_terms".to_string(),
                message: "you must accept the terms".to_string(),
            });
        }
        if failure.errors.is_empty() {
            Ok(())
        } else {
            Err(failure)
        }
    }
}

/// The full wizard draft. Never persisted as such.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationData {
    pub basic: BasicInfo,
    pub rules: RulesUnderstanding,
    pub situation: Situation,
    #[serde(default)]
    pub is_under12: bool,
}

impl ApplicationData {
    pub(crate) fn normalized(self) -> Self {
        let basic = self.basic.normalized();
        Self {
            is_under12: basic.is_under12(),
            basic,
            rules: self.rules.normalized(),
            situation: self.situation.normalized(),
        }
    }

    /// Validate every step at once, collecting all field errors.
    pub fn check(&self) -> Result<(), ValidationFailure> {
        let mut errors = Vec::new();
        if let Err(failure) = self.basic.validate() {
            errors.extend(ValidationFailure::from(failure).errors);
        }
        if let Err(failure) = self.rules.validate() {
            errors.extend(ValidationFailure::from(failure).errors);
        }
        if let Err(failure) = self.situation.check() {
            errors.extend(failure.errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure { errors })
        }
    }
}

/// Row of `applications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub season_id: Option<Uuid>,
    #[serde(flatten)]
    pub basic: BasicInfo,
    #[serde(flatten)]
    pub rules: RulesUnderstanding,
    #[serde(flatten)]
    pub situation: Situation,
    pub is_under12: bool,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for `applications`.
#[derive(Debug, Serialize)]
pub(crate) struct NewApplication<'a> {
    pub user_id: Uuid,
    pub season_id: Uuid,
    #[serde(flatten)]
    pub basic: &'a BasicInfo,
    #[serde(flatten)]
    pub rules: &'a RulesUnderstanding,
    #[serde(flatten)]
    pub situation: &'a Situation,
    pub is_under12: bool,
    pub status: ApplicationStatus,
    pub updated_at: DateTime<Utc>,
}

/// Moderator review of an application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// Row of `application_seasons`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSeason {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct SeasonDraft {
    #[validate(length(min = 1, max = 100, message = "season name must be 1-100 characters"))]
    pub name: String,
}
