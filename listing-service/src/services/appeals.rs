use crate::error::{AppError, Result};
use crate::metrics;
use crate::middleware::AuthUser;
use crate::models::{
    Appeal, AppealStatus, AuditAction, ModerationStatus, NotificationKind, NotificationPayload,
    Property, TargetKind,
};
use crate::services::audit::AuditTrail;
use crate::services::moderation::ModerationService;
use crate::services::notifier::Notifier;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Name of the partial unique index guarding pending appeals; violations of
/// it are the canonical duplicate-appeal signal.
const PENDING_APPEAL_INDEX: &str = "appeals_one_pending_per_property";

/// Admin verdict on an appeal. `Pending` is deliberately not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppealDecision {
    Approved,
    Rejected,
}

impl AppealDecision {
    pub fn to_status(self) -> AppealStatus {
        match self {
            AppealDecision::Approved => AppealStatus::Approved,
            AppealDecision::Rejected => AppealStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppealDecision::Approved => "approved",
            AppealDecision::Rejected => "rejected",
        }
    }
}

/// Appeal lifecycle service: agent-initiated creation with a uniqueness
/// guarantee, admin resolution with side effects on the listing.
#[derive(Clone)]
pub struct AppealService {
    db: Arc<PgPool>,
    audit: AuditTrail,
    notifier: Notifier,
    moderation: ModerationService,
}

impl AppealService {
    pub fn new(
        db: Arc<PgPool>,
        audit: AuditTrail,
        notifier: Notifier,
        moderation: ModerationService,
    ) -> Self {
        Self {
            db,
            audit,
            notifier,
            moderation,
        }
    }

    /// File an appeal against a rejected listing.
    ///
    /// Preconditions are checked in order; the first failure wins. The
    /// duplicate check here is advisory: under concurrent submissions the
    /// partial unique index is what actually holds the invariant, and its
    /// violation maps to the same `Conflict`.
    pub async fn file_appeal(
        &self,
        property_id: Uuid,
        reason: String,
        actor: &AuthUser,
    ) -> Result<Appeal> {
        if !actor.is_agent() {
            return Err(AppError::Forbidden(
                "only agents can submit appeals".to_string(),
            ));
        }

        let property = sqlx::query_as::<_, Property>(
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

        if property.agent_id != actor.id {
            return Err(AppError::Forbidden(
                "not authorized to appeal this listing".to_string(),
            ));
        }

        if property.moderation_status != ModerationStatus::Rejected {
            return Err(AppError::InvalidState(
                "only rejected listings can be appealed".to_string(),
            ));
        }

        let pending_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM appeals WHERE property_id = $1 AND status = $2)",
        )
        .bind(property_id)
        .bind(AppealStatus::Pending)
        .fetch_one(&*self.db)
        .await?;

        if pending_exists {
            return Err(AppError::Conflict(
                "an appeal for this listing is already pending".to_string(),
            ));
        }

        let appeal = sqlx::query_as::<_, Appeal>(
            r#"
            INSERT INTO appeals (property_id, agent_id, reason, status, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, property_id, agent_id, reason,
                      status, admin_id, admin_notes, created_at, reviewed_at
            "#,
        )
        .bind(property_id)
        .bind(actor.id)
        .bind(&reason)
        .bind(AppealStatus::Pending)
        .fetch_one(&*self.db)
        .await
        .map_err(|e| {
            if AppError::is_unique_violation(&e, PENDING_APPEAL_INDEX) {
                AppError::Conflict("an appeal for this listing is already pending".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        tracing::info!(
            appeal_id = %appeal.id,
            property_id = %property_id,
            agent_id = %actor.id,
            "appeal submitted"
        );

        self.audit
            .record(
                AuditAction::AppealCreated,
                actor.id,
                TargetKind::Appeal,
                appeal.id,
                serde_json::json!({
                    "property_id": property_id,
                    "reason": reason,
                }),
            )
            .await;

        let payload = NotificationPayload::new(
            NotificationKind::Info,
            "New appeal submitted",
            format!(
                "An agent appealed the rejection of listing \"{}\".",
                property.title
            ),
        )
        .related_to(TargetKind::Appeal, appeal.id);
        self.notifier.notify_admins(&payload).await;

        metrics::observe_appeal_filed();

        Ok(appeal)
    }

    /// Resolve a pending appeal (admin action).
    ///
    /// The update is keyed on `status = 'pending'`, so a second resolution
    /// attempt matches zero rows and none of the side effects can apply
    /// twice.
    pub async fn resolve_appeal(
        &self,
        appeal_id: Uuid,
        decision: AppealDecision,
        admin_notes: Option<String>,
        actor: &AuthUser,
    ) -> Result<Appeal> {
        actor.require_admin()?;

        let updated = sqlx::query_as::<_, Appeal>(
            r#"
            UPDATE appeals
            SET status = $2,
                admin_id = $3,
                admin_notes = $4,
                reviewed_at = NOW()
            WHERE id = $1 AND status = $5
            RETURNING id, property_id, agent_id, reason,
                      status, admin_id, admin_notes, created_at, reviewed_at
            "#,
        )
        .bind(appeal_id)
        .bind(decision.to_status())
        .bind(actor.id)
        .bind(&admin_notes)
        .bind(AppealStatus::Pending)
        .fetch_optional(&*self.db)
        .await?;

        let appeal = match updated {
            Some(appeal) => appeal,
            None => {
                // Distinguish a missing appeal from one already resolved
                let existing = self.fetch_appeal(appeal_id).await?;
                return match existing {
                    Some(appeal) => Err(AppError::InvalidState(format!(
                        "appeal already resolved: {}",
                        appeal.status.as_str()
                    ))),
                    None => Err(AppError::NotFound(format!(
                        "appeal {} not found",
                        appeal_id
                    ))),
                };
            }
        };

        tracing::info!(
            appeal_id = %appeal_id,
            admin_id = %actor.id,
            decision = %decision.as_str(),
            "appeal resolved"
        );

        if decision == AppealDecision::Approved {
            self.moderation
                .approve_via_appeal(appeal.property_id, appeal.id, actor.id)
                .await?;
        }

        self.audit
            .record(
                AuditAction::AppealUpdated,
                actor.id,
                TargetKind::Appeal,
                appeal.id,
                serde_json::json!({
                    "status": appeal.status.as_str(),
                    "admin_notes": admin_notes,
                }),
            )
            .await;

        let property_title =
            sqlx::query_scalar::<_, String>("SELECT title FROM properties WHERE id = $1")
                .bind(appeal.property_id)
                .fetch_optional(&*self.db)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "property title lookup failed for notification");
                    None
                })
                .unwrap_or_else(|| "your listing".to_string());

        let payload = match decision {
            AppealDecision::Approved => NotificationPayload::new(
                NotificationKind::Success,
                "Appeal approved",
                format!("Your appeal for \"{}\" was approved; the listing is live again.", property_title),
            ),
            AppealDecision::Rejected => NotificationPayload::new(
                NotificationKind::Error,
                "Appeal rejected",
                match &appeal.admin_notes {
                    Some(notes) => format!(
                        "Your appeal for \"{}\" was rejected: {}",
                        property_title, notes
                    ),
                    None => format!("Your appeal for \"{}\" was rejected.", property_title),
                },
            ),
        }
        .related_to(TargetKind::Appeal, appeal.id);
        self.notifier.notify(appeal.agent_id, &payload).await;

        metrics::observe_appeal_resolved(decision.as_str());

        Ok(appeal)
    }

    /// Get appeal by ID. Admins see any appeal, agents only their own.
    pub async fn get_appeal(&self, appeal_id: Uuid, actor: &AuthUser) -> Result<Appeal> {
        let appeal = self
            .fetch_appeal(appeal_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("appeal {} not found", appeal_id)))?;

        if !actor.is_admin() && appeal.agent_id != actor.id {
            return Err(AppError::Forbidden(
                "not authorized to view this appeal".to_string(),
            ));
        }

        Ok(appeal)
    }

    /// List appeals, newest first. Admins see all appeals, agents only their
    /// own; both may filter by status.
    pub async fn list_appeals(
        &self,
        status: Option<AppealStatus>,
        actor: &AuthUser,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Appeal>> {
        let appeals = if actor.is_admin() {
            if let Some(status) = status {
                sqlx::query_as::<_, Appeal>(
                    r#"
                    SELECT id, property_id, agent_id, reason,
                           status, admin_id, admin_notes, created_at, reviewed_at
                    FROM appeals
                    WHERE status = $1
                    ORDER BY created_at DESC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(status)
                .bind(limit)
                .bind(offset)
                .fetch_all(&*self.db)
                .await?
            } else {
                sqlx::query_as::<_, Appeal>(
                    r#"
                    SELECT id, property_id, agent_id, reason,
                           status, admin_id, admin_notes, created_at, reviewed_at
                    FROM appeals
                    ORDER BY created_at DESC
                    LIMIT $1 OFFSET $2
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&*self.db)
                .await?
            }
        } else if let Some(status) = status {
            sqlx::query_as::<_, Appeal>(
                r#"
                SELECT id, property_id, agent_id, reason,
                       status, admin_id, admin_notes, created_at, reviewed_at
                FROM appeals
                WHERE agent_id = $1 AND status = $2
                ORDER BY created_at DESC
                LIMIT $3 OFFSET $4
                "#,
            )
            .bind(actor.id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.db)
            .await?
        } else {
            sqlx::query_as::<_, Appeal>(
                r#"
                SELECT id, property_id, agent_id, reason,
                       status, admin_id, admin_notes, created_at, reviewed_at
                FROM appeals
                WHERE agent_id = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(actor.id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.db)
            .await?
        };

        Ok(appeals)
    }

    /// Count appeals visible to the actor
    pub async fn count_appeals(
        &self,
        status: Option<AppealStatus>,
        actor: &AuthUser,
    ) -> Result<i64> {
        let count = match (actor.is_admin(), status) {
            (true, Some(status)) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM appeals WHERE status = $1")
                    .bind(status)
                    .fetch_one(&*self.db)
                    .await?
            }
            (true, None) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM appeals")
                    .fetch_one(&*self.db)
                    .await?
            }
            (false, Some(status)) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM appeals WHERE agent_id = $1 AND status = $2",
                )
                .bind(actor.id)
                .bind(status)
                .fetch_one(&*self.db)
                .await?
            }
            (false, None) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM appeals WHERE agent_id = $1")
                    .bind(actor.id)
                    .fetch_one(&*self.db)
                    .await?
            }
        };

        Ok(count)
    }

    async fn fetch_appeal(&self, appeal_id: Uuid) -> Result<Option<Appeal>> {
        let appeal = sqlx::query_as::<_, Appeal>(
            r#"
            SELECT id, property_id, agent_id, reason,
                   status, admin_id, admin_notes, created_at, reviewed_at
            FROM appeals
            WHERE id = $1
            "#,
        )
        .bind(appeal_id)
        .fetch_optional(&*self.db)
        .await?;

        Ok(appeal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_to_status() {
        assert_eq!(AppealDecision::Approved.to_status(), AppealStatus::Approved);
        assert_eq!(AppealDecision::Rejected.to_status(), AppealStatus::Rejected);
    }

    #[test]
    fn test_decision_rejects_pending() {
        // "pending" must not parse as a resolution
        let parsed: std::result::Result<AppealDecision, _> =
            serde_json::from_str("\"pending\"");
        assert!(parsed.is_err());

        let approved: AppealDecision = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(approved, AppealDecision::Approved);
    }
}
