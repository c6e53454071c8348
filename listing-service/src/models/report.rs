use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User report against a listing. One per (property, reporter).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PropertyReport {
    pub id: Uuid,
    pub property_id: Uuid,
    pub reporter_id: Uuid,
    pub reason: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
