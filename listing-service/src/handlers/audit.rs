//! Audit trail read endpoint (admin forensics view)
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::TargetKind;
use crate::services::AuditTrail;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListAuditLogsQuery {
    pub target_type: Option<TargetKind>,
    pub target_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// List audit entries, optionally scoped to one target
///
/// GET /api/v1/audit-logs
pub async fn list_audit_logs(
    audit: web::Data<AuditTrail>,
    actor: AuthUser,
    query: web::Query<ListAuditLogsQuery>,
) -> Result<HttpResponse> {
    actor.require_admin()?;

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let entries = audit
        .list(query.target_type, query.target_id, limit, offset)
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/audit-logs").route("", web::get().to(list_audit_logs)));
}
