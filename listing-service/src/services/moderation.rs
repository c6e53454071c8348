use crate::error::{AppError, Result};
use crate::metrics;
use crate::middleware::AuthUser;
use crate::models::{
    AuditAction, ModerationStatus, NotificationKind, NotificationPayload, Property, TargetKind,
    UserRole,
};
use crate::services::audit::AuditTrail;
use crate::services::classifier::Verdict;
use crate::services::notifier::Notifier;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Admin decision over a listing awaiting review
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Reject,
}

impl ModerationAction {
    pub fn target_status(&self) -> ModerationStatus {
        match self {
            ModerationAction::Approve => ModerationStatus::Approved,
            ModerationAction::Reject => ModerationStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Approve => "approve",
            ModerationAction::Reject => "reject",
        }
    }
}

/// Owns the listing moderation state machine.
///
/// Every write to `properties.moderation_status` funnels through this
/// service, and every write is a conditional update keyed on the expected
/// prior status so concurrent decisions cannot clobber each other.
#[derive(Clone)]
pub struct ModerationService {
    db: Arc<PgPool>,
    audit: AuditTrail,
    notifier: Notifier,
}

impl ModerationService {
    pub fn new(db: Arc<PgPool>, audit: AuditTrail, notifier: Notifier) -> Self {
        Self {
            db,
            audit,
            notifier,
        }
    }

    /// Decide the status a new listing enters the system with.
    ///
    /// A flagged verdict wins over every role: admins bypass the queue but
    /// not the classifier. The returned notes enumerate matched terms.
    pub fn initial_status(
        submitter_role: UserRole,
        verdict: &Verdict,
    ) -> (ModerationStatus, Option<String>) {
        if verdict.flagged {
            let notes = format!(
                "Listing flagged for prohibited content: {}",
                verdict.matched_terms.join(", ")
            );
            return (ModerationStatus::Flagged, Some(notes));
        }

        match submitter_role {
            UserRole::Admin => (ModerationStatus::Approved, None),
            _ => (ModerationStatus::Pending, None),
        }
    }

    /// Apply an admin approve/reject decision to a listing awaiting review
    pub async fn decide(
        &self,
        property_id: Uuid,
        action: ModerationAction,
        notes: Option<String>,
        actor: &AuthUser,
    ) -> Result<Property> {
        actor.require_admin()?;

        let current = sqlx::query_as::<_, Property>(
            r#"
            SELECT id, agent_id, title, description, price_cents, address, city,
                   bedrooms, bathrooms, area_sqm,
                   moderation_status, moderation_notes, report_count,
                   created_at, updated_at
            FROM properties
            WHERE id = $1
            "#,
        )
        .bind(property_id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("property {} not found", property_id)))?;

        let new_status = action.target_status();
        if !current.moderation_status.can_transition_to(new_status)
            || !current.moderation_status.awaiting_review()
        {
            return Err(AppError::InvalidState(format!(
                "cannot {} a listing in status {}",
                action.as_str(),
                current.moderation_status.as_str()
            )));
        }

        // Keyed on the status we just read: if a concurrent decision landed
        // in between, zero rows match and nothing is clobbered.
        let updated = sqlx::query_as::<_, Property>(
            r#"
            UPDATE properties
            SET moderation_status = $2,
                moderation_notes = COALESCE($3, moderation_notes),
                updated_at = NOW()
            WHERE id = $1 AND moderation_status = $4
            RETURNING id, agent_id, title, description, price_cents, address, city,
                      bedrooms, bathrooms, area_sqm,
                      moderation_status, moderation_notes, report_count,
                      created_at, updated_at
            "#,
        )
        .bind(property_id)
        .bind(new_status)
        .bind(&notes)
        .bind(current.moderation_status)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| {
            AppError::Conflict("listing was moderated concurrently; reload and retry".to_string())
        })?;

        tracing::info!(
            property_id = %property_id,
            admin_id = %actor.id,
            previous_status = %current.moderation_status.as_str(),
            new_status = %new_status.as_str(),
            "moderation decision applied"
        );

        self.audit
            .record(
                AuditAction::PropertyModerationUpdated,
                actor.id,
                TargetKind::Property,
                property_id,
                serde_json::json!({
                    "previous_status": current.moderation_status.as_str(),
                    "new_status": new_status.as_str(),
                    "notes": notes,
                }),
            )
            .await;

        let payload = match action {
            ModerationAction::Approve => NotificationPayload::new(
                NotificationKind::Success,
                "Listing approved",
                format!("Your listing \"{}\" is now live.", updated.title),
            ),
            ModerationAction::Reject => NotificationPayload::new(
                NotificationKind::Warning,
                "Listing rejected",
                match &updated.moderation_notes {
                    Some(notes) => format!(
                        "Your listing \"{}\" was rejected: {}. You may appeal this decision.",
                        updated.title, notes
                    ),
                    None => format!(
                        "Your listing \"{}\" was rejected. You may appeal this decision.",
                        updated.title
                    ),
                },
            ),
        }
        .related_to(TargetKind::Property, property_id);
        self.notifier.notify(updated.agent_id, &payload).await;

        metrics::observe_moderation_decision(action.as_str());

        Ok(updated)
    }

    /// Revive a rejected listing after its appeal was approved.
    ///
    /// Conditional on the listing still being rejected. Returns false when a
    /// concurrent transition won the race, in which case the listing is left
    /// as that transition set it and no audit entry is written here.
    pub async fn approve_via_appeal(
        &self,
        property_id: Uuid,
        appeal_id: Uuid,
        admin_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE properties
            SET moderation_status = $2, updated_at = NOW()
            WHERE id = $1 AND moderation_status = $3
            "#,
        )
        .bind(property_id)
        .bind(ModerationStatus::Approved)
        .bind(ModerationStatus::Rejected)
        .execute(&*self.db)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(
                property_id = %property_id,
                appeal_id = %appeal_id,
                "listing no longer rejected at appeal approval; leaving status untouched"
            );
            return Ok(false);
        }

        tracing::info!(
            property_id = %property_id,
            appeal_id = %appeal_id,
            "listing revived by approved appeal"
        );

        self.audit
            .record(
                AuditAction::PropertyModerationUpdated,
                admin_id,
                TargetKind::Property,
                property_id,
                serde_json::json!({
                    "previous_status": ModerationStatus::Rejected.as_str(),
                    "new_status": ModerationStatus::Approved.as_str(),
                    "appeal_id": appeal_id,
                }),
            )
            .await;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_verdict() -> Verdict {
        Verdict::clean()
    }

    fn flagged_verdict(terms: &[&str]) -> Verdict {
        Verdict {
            flagged: true,
            matched_terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_admin_clean_listing_is_approved() {
        let (status, notes) =
            ModerationService::initial_status(UserRole::Admin, &clean_verdict());
        assert_eq!(status, ModerationStatus::Approved);
        assert!(notes.is_none());
    }

    #[test]
    fn test_agent_clean_listing_is_pending() {
        let (status, notes) =
            ModerationService::initial_status(UserRole::Agent, &clean_verdict());
        assert_eq!(status, ModerationStatus::Pending);
        assert!(notes.is_none());
    }

    #[test]
    fn test_flagged_listing_overrides_admin_bypass() {
        let verdict = flagged_verdict(&["western union"]);
        let (status, notes) = ModerationService::initial_status(UserRole::Admin, &verdict);
        assert_eq!(status, ModerationStatus::Flagged);
        assert!(notes.unwrap().contains("western union"));
    }

    #[test]
    fn test_flagged_notes_enumerate_all_terms() {
        let verdict = flagged_verdict(&["moneygram", "no children"]);
        let (status, notes) = ModerationService::initial_status(UserRole::Agent, &verdict);
        assert_eq!(status, ModerationStatus::Flagged);
        let notes = notes.unwrap();
        assert!(notes.contains("moneygram"));
        assert!(notes.contains("no children"));
    }

    #[test]
    fn test_action_target_status() {
        assert_eq!(
            ModerationAction::Approve.target_status(),
            ModerationStatus::Approved
        );
        assert_eq!(
            ModerationAction::Reject.target_status(),
            ModerationStatus::Rejected
        );
    }
}
