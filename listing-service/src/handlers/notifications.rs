//! Notification endpoints for the current user
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::services::Notifier;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// List the current user's notifications, newest first
///
/// GET /api/v1/notifications
pub async fn list_notifications(
    notifier: web::Data<Notifier>,
    actor: AuthUser,
    query: web::Query<ListNotificationsQuery>,
) -> Result<HttpResponse> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let notifications = notifier
        .list_for_user(actor.id, query.unread_only, limit, offset)
        .await?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// Count the current user's unread notifications
///
/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    notifier: web::Data<Notifier>,
    actor: AuthUser,
) -> Result<HttpResponse> {
    let count = notifier.unread_count(actor.id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "unread_count": count })))
}

/// Mark one notification as read
///
/// PUT /api/v1/notifications/{id}/read
pub async fn mark_as_read(
    notifier: web::Data<Notifier>,
    actor: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let notification_id = path.into_inner();
    if notifier.mark_read(actor.id, notification_id).await? {
        Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
    } else {
        Err(AppError::NotFound(format!(
            "notification {} not found",
            notification_id
        )))
    }
}

/// Mark all of the current user's notifications as read
///
/// PUT /api/v1/notifications/read-all
pub async fn mark_all_read(
    notifier: web::Data<Notifier>,
    actor: AuthUser,
) -> Result<HttpResponse> {
    let updated = notifier.mark_all_read(actor.id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": updated })))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(list_notifications))
            .route("/unread-count", web::get().to(unread_count))
            .route("/read-all", web::put().to(mark_all_read))
            .route("/{id}/read", web::put().to(mark_as_read)),
    );
}
