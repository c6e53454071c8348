use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Appeal status enum with state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appeal_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppealStatus {
    Pending,
    Approved,
    Rejected,
}

impl AppealStatus {
    /// Validate state transition (pending -> approved/rejected only)
    pub fn can_transition_to(&self, new_status: AppealStatus) -> bool {
        matches!(
            (self, new_status),
            (AppealStatus::Pending, AppealStatus::Approved)
                | (AppealStatus::Pending, AppealStatus::Rejected)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppealStatus::Pending => "pending",
            AppealStatus::Approved => "approved",
            AppealStatus::Rejected => "rejected",
        }
    }
}

/// Appeal record
///
/// Filed by the agent who owns a rejected listing; resolved by an admin.
/// Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appeal {
    pub id: Uuid,
    pub property_id: Uuid,
    pub agent_id: Uuid,
    pub reason: String,
    pub status: AppealStatus,
    pub admin_id: Option<Uuid>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}
