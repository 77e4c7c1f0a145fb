use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sighting {
    pub id: Uuid,
    pub user_id: Uuid,
    pub drive_session_id: Option<Uuid>,
    pub species_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub count: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A sighting joined with the names a list or map marker shows.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SightingView {
    pub id: Uuid,
    pub drive_session_id: Option<Uuid>,
    pub species_id: Uuid,
    pub species_common_name: String,
    pub user_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub count: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
