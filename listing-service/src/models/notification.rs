use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::audit::TargetKind;

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
    Warning,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
        }
    }
}

/// Notification record addressed to a single recipient
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub related_type: Option<String>,
    pub related_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Content of a notification, independent of its recipients. Fan-out to N
/// recipients produces N rows from one payload.
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub related: Option<(TargetKind, Uuid)>,
}

impl NotificationPayload {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            related: None,
        }
    }

    pub fn related_to(mut self, kind: TargetKind, id: Uuid) -> Self {
        self.related = Some((kind, id));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serialization() {
        for kind in [
            NotificationKind::Info,
            NotificationKind::Success,
            NotificationKind::Error,
            NotificationKind::Warning,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            let parsed: NotificationKind = serde_json::from_str(&json).unwrap();
            assert_eq!(kind, parsed);
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_payload_builder() {
        let appeal_id = Uuid::new_v4();
        let payload = NotificationPayload::new(
            NotificationKind::Info,
            "New appeal",
            "An agent appealed a rejected listing",
        )
        .related_to(TargetKind::Appeal, appeal_id);

        assert_eq!(payload.kind, NotificationKind::Info);
        assert_eq!(payload.related, Some((TargetKind::Appeal, appeal_id)));
    }
}
