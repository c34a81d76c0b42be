use serde::{Deserialize, Serialize};

/// Moderation state shared by applications, absences, partner applications,
/// and account requests. `Pending` moves to a final state exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub const fn is_final(self) -> bool {
        !matches!(self, ReviewStatus::Pending)
    }
}

/// Reviewer verdict on a pending item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub const fn outcome(self) -> ReviewStatus {
        match self {
            Decision::Approve => ReviewStatus::Approved,
            Decision::Reject => ReviewStatus::Rejected,
        }
    }
}

/// `{"decision": "approve" | "reject"}` request body.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DecisionBody {
    pub decision: Decision,
}

/// `?status=` query string accepted by moderator listings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StatusFilter {
    pub status: Option<ReviewStatus>,
}
