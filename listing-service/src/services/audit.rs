use crate::error::Result;
use crate::models::{AuditAction, AuditLogEntry, TargetKind};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Append-only audit trail for privileged state changes.
///
/// `record` never fails: a moderation or appeal transition must not roll back
/// because audit persistence had a transient error, so write failures are
/// logged and swallowed. Callers must treat the trail as best-effort.
#[derive(Clone)]
pub struct AuditTrail {
    db: Arc<PgPool>,
}

impl AuditTrail {
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }

    /// Record a privileged state change. Best-effort; see type docs.
    pub async fn record(
        &self,
        action: AuditAction,
        actor_id: Uuid,
        target: TargetKind,
        target_id: Uuid,
        details: serde_json::Value,
    ) {
        if let Err(e) = self
            .insert(action, actor_id, target, target_id, details)
            .await
        {
            tracing::warn!(
                action = %action.as_str(),
                target_type = %target.as_str(),
                target_id = %target_id,
                error = %e,
                "audit log write failed; continuing"
            );
        }
    }

    async fn insert(
        &self,
        action: AuditAction,
        actor_id: Uuid,
        target: TargetKind,
        target_id: Uuid,
        details: serde_json::Value,
    ) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (action, actor_id, target_type, target_id, details, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            "#,
        )
        .bind(action.as_str())
        .bind(actor_id)
        .bind(target.as_str())
        .bind(target_id)
        .bind(&details)
        .execute(&*self.db)
        .await?;

        tracing::debug!(
            action = %action.as_str(),
            actor_id = %actor_id,
            target_type = %target.as_str(),
            target_id = %target_id,
            "audit entry recorded"
        );

        Ok(())
    }

    /// List audit entries, optionally scoped to one target (admin view)
    pub async fn list(
        &self,
        target_type: Option<TargetKind>,
        target_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLogEntry>> {
        let entries = if let (Some(target_type), Some(target_id)) = (target_type, target_id) {
            sqlx::query_as::<_, AuditLogEntry>(
                r#"
                SELECT id, action, actor_id, target_type, target_id, details, created_at
                FROM audit_logs
                WHERE target_type = $1 AND target_id = $2
                ORDER BY created_at DESC
                LIMIT $3 OFFSET $4
                "#,
            )
            .bind(target_type.as_str())
            .bind(target_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.db)
            .await?
        } else {
            sqlx::query_as::<_, AuditLogEntry>(
                r#"
                SELECT id, action, actor_id, target_type, target_id, details, created_at
                FROM audit_logs
                ORDER BY created_at DESC
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.db)
            .await?
        };

        Ok(entries)
    }
}
