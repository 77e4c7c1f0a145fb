use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::sighting::SightingView;
use crate::track::TrackPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivePhoto {
    pub url: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub caption: Option<String>,
}

#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lodge_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub route: Json<Vec<TrackPoint>>, // DDL says jsonb
    pub photos: Json<Vec<DrivePhoto>>,
    pub notes: Option<String>,
}

impl DriveSession {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Row of the drive history list.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub point_count: i32,
    pub sighting_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveDetail {
    #[serde(flatten)]
    pub drive: DriveSession,
    pub sightings: Vec<SightingView>,
}
