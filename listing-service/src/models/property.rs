use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Moderation status enum with state machine
///
/// `Pending` and `Flagged` are entry states assigned at creation. `Approved`
/// and `Rejected` are reached through an admin decision, and a rejected
/// listing can be revived to `Approved` through an approved appeal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "moderation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
    Flagged,
}

impl ModerationStatus {
    /// Validate a state transition
    pub fn can_transition_to(&self, new_status: ModerationStatus) -> bool {
        matches!(
            (self, new_status),
            (ModerationStatus::Pending, ModerationStatus::Approved)
                | (ModerationStatus::Pending, ModerationStatus::Rejected)
                | (ModerationStatus::Flagged, ModerationStatus::Approved)
                | (ModerationStatus::Flagged, ModerationStatus::Rejected)
                // Appeal approval is the one path that revives a rejected listing
                | (ModerationStatus::Rejected, ModerationStatus::Approved)
        )
    }

    /// True for the states an admin decision may act on
    pub fn awaiting_review(&self) -> bool {
        matches!(self, ModerationStatus::Pending | ModerationStatus::Flagged)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
            ModerationStatus::Flagged => "flagged",
        }
    }
}

/// Property listing record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Property {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub address: String,
    pub city: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area_sqm: Option<f64>,
    pub moderation_status: ModerationStatus,
    pub moderation_notes: Option<String>,
    pub report_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_decision_transitions() {
        assert!(ModerationStatus::Pending.can_transition_to(ModerationStatus::Approved));
        assert!(ModerationStatus::Pending.can_transition_to(ModerationStatus::Rejected));
        assert!(ModerationStatus::Flagged.can_transition_to(ModerationStatus::Approved));
        assert!(ModerationStatus::Flagged.can_transition_to(ModerationStatus::Rejected));
    }

    #[test]
    fn test_appeal_revival_transition() {
        assert!(ModerationStatus::Rejected.can_transition_to(ModerationStatus::Approved));
        assert!(!ModerationStatus::Rejected.can_transition_to(ModerationStatus::Pending));
        assert!(!ModerationStatus::Rejected.can_transition_to(ModerationStatus::Flagged));
    }

    #[test]
    fn test_entry_states_unreachable_after_creation() {
        for status in [
            ModerationStatus::Pending,
            ModerationStatus::Approved,
            ModerationStatus::Rejected,
            ModerationStatus::Flagged,
        ] {
            assert!(!status.can_transition_to(ModerationStatus::Pending));
            assert!(!status.can_transition_to(ModerationStatus::Flagged));
        }
    }

    #[test]
    fn test_awaiting_review() {
        assert!(ModerationStatus::Pending.awaiting_review());
        assert!(ModerationStatus::Flagged.awaiting_review());
        assert!(!ModerationStatus::Approved.awaiting_review());
        assert!(!ModerationStatus::Rejected.awaiting_review());
    }
}
