use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub species_id: Uuid,
    pub spotted: bool,
    pub sighting_count: i32,
    pub first_spotted_at: Option<DateTime<Utc>>,
    pub last_latitude: Option<f64>,
    pub last_longitude: Option<f64>,
}

/// A species as it appears on one guide's checklist.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistEntry {
    pub species_id: Uuid,
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub category: String,
    pub family: Option<String>,
    pub spotted: bool,
    pub sighting_count: i32,
    pub first_spotted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub total: i64,
    pub spotted: i64,
}

#[derive(Debug, Serialize)]
pub struct ChecklistStats {
    pub total: i64,
    pub spotted: i64,
    pub categories: Vec<CategoryStats>,
}
