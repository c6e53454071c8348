//! Appeal endpoints: filing, listing, resolution
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{Appeal, AppealStatus};
use crate::services::{AppealDecision, AppealService};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct FileAppealRequest {
    pub property_id: Uuid,
    #[validate(length(min = 10, max = 5000))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResolveAppealRequest {
    pub status: AppealDecision,
    #[validate(length(max = 2000))]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListAppealsQuery {
    pub status: Option<AppealStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AppealsListResponse {
    pub appeals: Vec<Appeal>,
    pub total_count: i64,
    pub has_more: bool,
}

/// File an appeal against a rejected listing
///
/// POST /api/v1/appeals
pub async fn file_appeal(
    service: web::Data<AppealService>,
    actor: AuthUser,
    req: web::Json<FileAppealRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let appeal = service
        .file_appeal(req.property_id, req.reason.clone(), &actor)
        .await?;
    Ok(HttpResponse::Created().json(appeal))
}

/// List appeals visible to the caller, newest first
///
/// GET /api/v1/appeals
pub async fn list_appeals(
    service: web::Data<AppealService>,
    actor: AuthUser,
    query: web::Query<ListAppealsQuery>,
) -> Result<HttpResponse> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let appeals = service
        .list_appeals(query.status, &actor, limit, offset)
        .await?;
    let total_count = service.count_appeals(query.status, &actor).await?;
    let has_more = offset + limit < total_count;

    Ok(HttpResponse::Ok().json(AppealsListResponse {
        appeals,
        total_count,
        has_more,
    }))
}

/// Fetch one appeal
///
/// GET /api/v1/appeals/{id}
pub async fn get_appeal(
    service: web::Data<AppealService>,
    actor: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let appeal = service.get_appeal(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(appeal))
}

/// Resolve a pending appeal
///
/// POST /api/v1/appeals/{id}/resolution
pub async fn resolve_appeal(
    service: web::Data<AppealService>,
    actor: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<ResolveAppealRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let appeal = service
        .resolve_appeal(
            path.into_inner(),
            req.status,
            req.admin_notes.clone(),
            &actor,
        )
        .await?;
    Ok(HttpResponse::Ok().json(appeal))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/appeals")
            .route("", web::post().to(file_appeal))
            .route("", web::get().to(list_appeals))
            .route("/{id}", web::get().to(get_appeal))
            .route("/{id}/resolution", web::post().to(resolve_appeal)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_reason_rejected() {
        let req = FileAppealRequest {
            property_id: Uuid::new_v4(),
            reason: "too short".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_resolution_parsing() {
        let req: ResolveAppealRequest =
            serde_json::from_str(r#"{"status": "approved", "admin_notes": "verified"}"#).unwrap();
        assert_eq!(req.status, AppealDecision::Approved);
        assert_eq!(req.admin_notes.as_deref(), Some("verified"));

        // a resolution cannot set an appeal back to pending
        let bad: std::result::Result<ResolveAppealRequest, _> =
            serde_json::from_str(r#"{"status": "pending"}"#);
        assert!(bad.is_err());
    }
}
