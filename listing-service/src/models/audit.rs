use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Closed set of auditable actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    PropertyCreated,
    PropertyModerationUpdated,
    PropertyReported,
    AppealCreated,
    AppealUpdated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::PropertyCreated => "property_created",
            AuditAction::PropertyModerationUpdated => "property_moderation_updated",
            AuditAction::PropertyReported => "property_reported",
            AuditAction::AppealCreated => "appeal_created",
            AuditAction::AppealUpdated => "appeal_updated",
        }
    }
}

/// Entity kind an audit entry or notification points back to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Property,
    Appeal,
    User,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Property => "property",
            TargetKind::Appeal => "appeal",
            TargetKind::User => "user",
        }
    }
}

/// Audit trail record. Append-only; rows are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub action: String,
    pub actor_id: Uuid,
    pub target_type: String,
    pub target_id: Uuid,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_names() {
        assert_eq!(AuditAction::PropertyCreated.as_str(), "property_created");
        assert_eq!(
            AuditAction::PropertyModerationUpdated.as_str(),
            "property_moderation_updated"
        );
        assert_eq!(AuditAction::AppealCreated.as_str(), "appeal_created");
        assert_eq!(AuditAction::AppealUpdated.as_str(), "appeal_updated");
    }

    #[test]
    fn test_action_serde_matches_wire_name() {
        for action in [
            AuditAction::PropertyCreated,
            AuditAction::PropertyModerationUpdated,
            AuditAction::PropertyReported,
            AuditAction::AppealCreated,
            AuditAction::AppealUpdated,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }
}
