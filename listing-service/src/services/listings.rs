use crate::error::{AppError, Result};
use crate::metrics;
use crate::middleware::AuthUser;
use crate::models::{
    AuditAction, ModerationStatus, NotificationKind, NotificationPayload, Property,
    PropertyReport, TargetKind, UserRole,
};
use crate::services::audit::AuditTrail;
use crate::services::classifier::ListingClassifier;
use crate::services::moderation::ModerationService;
use crate::services::notifier::Notifier;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Fields accepted when an agent submits a listing
#[derive(Debug, Clone)]
pub struct CreateListingInput {
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub address: String,
    pub city: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area_sqm: Option<f64>,
}

/// Listing lifecycle service: submission, reads and user reports
#[derive(Clone)]
pub struct ListingService {
    db: Arc<PgPool>,
    classifier: Arc<ListingClassifier>,
    audit: AuditTrail,
    notifier: Notifier,
    report_alert_threshold: i32,
}

impl ListingService {
    pub fn new(
        db: Arc<PgPool>,
        classifier: Arc<ListingClassifier>,
        audit: AuditTrail,
        notifier: Notifier,
        report_alert_threshold: i32,
    ) -> Self {
        Self {
            db,
            classifier,
            audit,
            notifier,
            report_alert_threshold,
        }
    }

    /// Submit a new listing.
    ///
    /// The classifier verdict and the submitter role decide the status the
    /// listing enters moderation with; see `ModerationService::initial_status`.
    pub async fn create_listing(
        &self,
        input: CreateListingInput,
        actor: &AuthUser,
    ) -> Result<Property> {
        if actor.role == UserRole::User {
            return Err(AppError::Forbidden(
                "only agents can publish listings".to_string(),
            ));
        }

        let verdict = self.classifier.classify(&input.title, &input.description);
        let (status, notes) = ModerationService::initial_status(actor.role, &verdict);

        let property = sqlx::query_as::<_, Property>(
            r#"
            INSERT INTO properties (
                agent_id, title, description, price_cents, address, city,
                bedrooms, bathrooms, area_sqm,
                moderation_status, moderation_notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW())
            RETURNING id, agent_id, title, description, price_cents, address, city,
                      bedrooms, bathrooms, area_sqm,
                      moderation_status, moderation_notes, report_count,
                      created_at, updated_at
            "#,
        )
        .bind(actor.id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.price_cents)
        .bind(&input.address)
        .bind(&input.city)
        .bind(input.bedrooms)
        .bind(input.bathrooms)
        .bind(input.area_sqm)
        .bind(status)
        .bind(&notes)
        .fetch_one(&*self.db)
        .await?;

        tracing::info!(
            property_id = %property.id,
            agent_id = %actor.id,
            status = %status.as_str(),
            "listing submitted"
        );

        self.audit
            .record(
                AuditAction::PropertyCreated,
                actor.id,
                TargetKind::Property,
                property.id,
                serde_json::json!({
                    "property_title": property.title,
                    "moderation_status": status.as_str(),
                }),
            )
            .await;

        if status == ModerationStatus::Flagged {
            let payload = NotificationPayload::new(
                NotificationKind::Warning,
                "Listing flagged for review",
                format!(
                    "Listing \"{}\" was flagged by the content classifier and needs review.",
                    property.title
                ),
            )
            .related_to(TargetKind::Property, property.id);
            self.notifier.notify_admins(&payload).await;
        }

        metrics::observe_listing_submitted(status.as_str());

        Ok(property)
    }

    /// Fetch one listing
    pub async fn get_listing(&self, property_id: Uuid) -> Result<Property> {
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

        Ok(property)
    }

    /// List listings in one moderation status, newest first
    pub async fn list_by_status(
        &self,
        status: ModerationStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Property>> {
        let properties = sqlx::query_as::<_, Property>(
            r#"
            SELECT id, agent_id, title, description, price_cents, address, city,
                   bedrooms, bathrooms, area_sqm,
                   moderation_status, moderation_notes, report_count,
                   created_at, updated_at
            FROM properties
            WHERE moderation_status = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&*self.db)
        .await?;

        Ok(properties)
    }

    /// List an agent's own listings regardless of status, newest first
    pub async fn list_for_agent(
        &self,
        agent_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Property>> {
        let properties = sqlx::query_as::<_, Property>(
            r#"
            SELECT id, agent_id, title, description, price_cents, address, city,
                   bedrooms, bathrooms, area_sqm,
                   moderation_status, moderation_notes, report_count,
                   created_at, updated_at
            FROM properties
            WHERE agent_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(agent_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&*self.db)
        .await?;

        Ok(properties)
    }

    /// Report a listing.
    ///
    /// One report per (listing, reporter); the counter bump and the report
    /// row commit atomically. Admins are alerted when the counter reaches
    /// the configured threshold.
    pub async fn report_listing(
        &self,
        property_id: Uuid,
        reason: String,
        description: Option<String>,
        actor: &AuthUser,
    ) -> Result<PropertyReport> {
        let property = self.get_listing(property_id).await?;

        if property.agent_id == actor.id {
            return Err(AppError::Forbidden(
                "cannot report your own listing".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let report = sqlx::query_as::<_, PropertyReport>(
            r#"
            INSERT INTO property_reports (property_id, reporter_id, reason, description, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, property_id, reporter_id, reason, description, created_at
            "#,
        )
        .bind(property_id)
        .bind(actor.id)
        .bind(&reason)
        .bind(&description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if AppError::is_unique_violation(&e, "property_reports_one_per_reporter") {
                AppError::Conflict("you have already reported this listing".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        let report_count = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE properties
            SET report_count = report_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING report_count
            "#,
        )
        .bind(property_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            property_id = %property_id,
            reporter_id = %actor.id,
            report_count = report_count,
            "listing reported"
        );

        self.audit
            .record(
                AuditAction::PropertyReported,
                actor.id,
                TargetKind::Property,
                property_id,
                serde_json::json!({
                    "reason": reason,
                    "report_count": report_count,
                }),
            )
            .await;

        if report_count >= self.report_alert_threshold {
            let payload = NotificationPayload::new(
                NotificationKind::Warning,
                "Listing heavily reported",
                format!(
                    "Listing \"{}\" has been reported {} times and may need review.",
                    property.title, report_count
                ),
            )
            .related_to(TargetKind::Property, property_id);
            self.notifier.notify_admins(&payload).await;
        }

        Ok(report)
    }
}
