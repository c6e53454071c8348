//! Listing endpoints: submission, reads, admin moderation queue, reports
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::ModerationStatus;
use crate::services::{CreateListingInput, ListingService, ModerationAction, ModerationService};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePropertyRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 10000))]
    pub description: String,
    #[validate(range(min = 0))]
    pub price_cents: i64,
    #[validate(length(min = 1, max = 300))]
    pub address: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(range(min = 0, max = 50))]
    #[serde(default)]
    pub bedrooms: i32,
    #[validate(range(min = 0, max = 50))]
    #[serde(default)]
    pub bathrooms: i32,
    #[validate(range(min = 0.0))]
    pub area_sqm: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ListPropertiesQuery {
    pub status: Option<ModerationStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ModeratePropertyRequest {
    pub action: ModerationAction,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReportPropertyRequest {
    #[validate(length(min = 1, max = 100))]
    pub reason: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (limit.unwrap_or(20).clamp(1, 100), offset.unwrap_or(0).max(0))
}

/// Submit a new listing
///
/// POST /api/v1/properties
pub async fn create_property(
    service: web::Data<ListingService>,
    actor: AuthUser,
    req: web::Json<CreatePropertyRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let input = CreateListingInput {
        title: req.title.clone(),
        description: req.description.clone(),
        price_cents: req.price_cents,
        address: req.address.clone(),
        city: req.city.clone(),
        bedrooms: req.bedrooms,
        bathrooms: req.bathrooms,
        area_sqm: req.area_sqm,
    };

    let property = service.create_listing(input, &actor).await?;
    Ok(HttpResponse::Created().json(property))
}

/// Fetch one listing
///
/// GET /api/v1/properties/{id}
pub async fn get_property(
    service: web::Data<ListingService>,
    actor: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let property = service.get_listing(path.into_inner()).await?;

    // Unapproved listings are visible only to their agent and to admins;
    // everyone else sees the same 404 as for a listing that never existed.
    if property.moderation_status != ModerationStatus::Approved
        && !actor.is_admin()
        && property.agent_id != actor.id
    {
        return Err(AppError::NotFound(format!(
            "property {} not found",
            property.id
        )));
    }

    Ok(HttpResponse::Ok().json(property))
}

/// List listings by moderation status, newest first
///
/// GET /api/v1/properties
pub async fn list_properties(
    service: web::Data<ListingService>,
    actor: AuthUser,
    query: web::Query<ListPropertiesQuery>,
) -> Result<HttpResponse> {
    let status = query.status.unwrap_or(ModerationStatus::Approved);
    if status != ModerationStatus::Approved && !actor.is_admin() {
        return Err(AppError::Forbidden(
            "the moderation queue is restricted to administrators".to_string(),
        ));
    }

    let (limit, offset) = page(query.limit, query.offset);
    let properties = service.list_by_status(status, limit, offset).await?;
    Ok(HttpResponse::Ok().json(properties))
}

/// List the calling agent's own listings regardless of status
///
/// GET /api/v1/properties/mine
pub async fn list_own_properties(
    service: web::Data<ListingService>,
    actor: AuthUser,
    query: web::Query<ListPropertiesQuery>,
) -> Result<HttpResponse> {
    let (limit, offset) = page(query.limit, query.offset);
    let properties = service.list_for_agent(actor.id, limit, offset).await?;
    Ok(HttpResponse::Ok().json(properties))
}

/// Apply an admin moderation decision
///
/// POST /api/v1/properties/{id}/moderation
pub async fn moderate_property(
    service: web::Data<ModerationService>,
    actor: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<ModeratePropertyRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let property = service
        .decide(path.into_inner(), req.action, req.notes.clone(), &actor)
        .await?;
    Ok(HttpResponse::Ok().json(property))
}

/// Report a listing
///
/// POST /api/v1/properties/{id}/reports
pub async fn report_property(
    service: web::Data<ListingService>,
    actor: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<ReportPropertyRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let report = service
        .report_listing(
            path.into_inner(),
            req.reason.clone(),
            req.description.clone(),
            &actor,
        )
        .await?;
    Ok(HttpResponse::Created().json(report))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/properties")
            .route("", web::post().to(create_property))
            .route("", web::get().to(list_properties))
            .route("/mine", web::get().to(list_own_properties))
            .route("/{id}", web::get().to(get_property))
            .route("/{id}/moderation", web::post().to(moderate_property))
            .route("/{id}/reports", web::post().to(report_property)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let req = CreatePropertyRequest {
            title: String::new(),
            description: "A description".to_string(),
            price_cents: 100_000,
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            bedrooms: 2,
            bathrooms: 1,
            area_sqm: Some(75.0),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_negative_price_rejected() {
        let req = CreatePropertyRequest {
            title: "Condo".to_string(),
            description: "A description".to_string(),
            price_cents: -1,
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            bedrooms: 2,
            bathrooms: 1,
            area_sqm: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_page_clamps_limit() {
        assert_eq!(page(Some(1000), None), (100, 0));
        assert_eq!(page(None, Some(-5)), (20, 0));
        assert_eq!(page(Some(10), Some(30)), (10, 30));
    }

    #[test]
    fn test_moderation_action_parsing() {
        let req: ModeratePropertyRequest =
            serde_json::from_str(r#"{"action": "approve"}"#).unwrap();
        assert_eq!(req.action, ModerationAction::Approve);

        let bad: std::result::Result<ModeratePropertyRequest, _> =
            serde_json::from_str(r#"{"action": "escalate"}"#);
        assert!(bad.is_err());
    }
}
