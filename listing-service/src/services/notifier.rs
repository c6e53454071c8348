use crate::error::Result;
use crate::metrics;
use crate::models::{Notification, NotificationPayload, UserRole};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Creates user-visible notification records.
///
/// All dispatch entry points are best-effort: a failed insert is logged and
/// does not abort the transition that triggered it, and in a fan-out each
/// recipient's insert is independent of the others.
#[derive(Clone)]
pub struct Notifier {
    db: Arc<PgPool>,
}

impl Notifier {
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }

    /// Dispatch one notification to one recipient. Best-effort.
    pub async fn notify(&self, recipient_id: Uuid, payload: &NotificationPayload) {
        if let Err(e) = self.insert(recipient_id, payload).await {
            tracing::warn!(
                recipient_id = %recipient_id,
                title = %payload.title,
                error = %e,
                "notification write failed; continuing"
            );
        }
    }

    /// Fan a payload out to a recipient set, one record per recipient.
    /// A failed insert does not block the remaining recipients.
    pub async fn notify_many(&self, recipient_ids: &[Uuid], payload: &NotificationPayload) {
        for recipient_id in recipient_ids {
            self.notify(*recipient_id, payload).await;
        }
    }

    /// Broadcast to every admin account
    pub async fn notify_admins(&self, payload: &NotificationPayload) {
        let admin_ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE role = $1")
            .bind(UserRole::Admin)
            .fetch_all(&*self.db)
            .await;

        match admin_ids {
            Ok(ids) => {
                tracing::debug!(recipients = ids.len(), title = %payload.title, "admin fan-out");
                self.notify_many(&ids, payload).await;
            }
            Err(e) => {
                tracing::warn!(
                    title = %payload.title,
                    error = %e,
                    "admin lookup for notification fan-out failed; continuing"
                );
            }
        }
    }

    async fn insert(
        &self,
        recipient_id: Uuid,
        payload: &NotificationPayload,
    ) -> std::result::Result<(), sqlx::Error> {
        let (related_type, related_id) = match payload.related {
            Some((kind, id)) => (Some(kind.as_str()), Some(id)),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO notifications (recipient_id, title, message, kind, related_type, related_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            "#,
        )
        .bind(recipient_id)
        .bind(&payload.title)
        .bind(&payload.message)
        .bind(payload.kind)
        .bind(related_type)
        .bind(related_id)
        .execute(&*self.db)
        .await?;

        metrics::observe_notification_dispatched();
        Ok(())
    }

    /// List a user's notifications, newest first
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        let notifications = if unread_only {
            sqlx::query_as::<_, Notification>(
                r#"
                SELECT id, recipient_id, title, message, kind,
                       related_type, related_id, is_read, created_at, read_at
                FROM notifications
                WHERE recipient_id = $1 AND is_read = FALSE
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.db)
            .await?
        } else {
            sqlx::query_as::<_, Notification>(
                r#"
                SELECT id, recipient_id, title, message, kind,
                       related_type, related_id, is_read, created_at, read_at
                FROM notifications
                WHERE recipient_id = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.db)
            .await?
        };

        Ok(notifications)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&*self.db)
        .await?;

        Ok(count)
    }

    /// Mark one notification read. Returns false when it does not exist or
    /// belongs to another user.
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = NOW()
            WHERE id = $1 AND recipient_id = $2
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&*self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = NOW()
            WHERE recipient_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(user_id)
        .execute(&*self.db)
        .await?;

        Ok(result.rows_affected())
    }
}
