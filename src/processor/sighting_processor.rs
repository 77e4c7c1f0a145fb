use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::db::{queries, DbPool};
use crate::error::{ApiError, ApiResult};
use crate::models::checklist::ChecklistItem;
use crate::models::sighting::{Sighting, SightingView};

pub const DEFAULT_RECENT_LIMIT: i64 = 5;
pub const MAX_RECENT_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSighting {
    pub drive_session_id: Option<Uuid>,
    pub species_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_count")]
    pub count: i32,
    pub notes: Option<String>,
}

fn default_count() -> i32 {
    1
}

/// Record a sighting and tick the species off the user's checklist in one transaction.
pub async fn create_sighting(pool: &DbPool, user_id: Uuid, input: NewSighting) -> ApiResult<Sighting> {
    if input.count < 1 {
        return Err(ApiError::bad_request("count must be at least 1"));
    }
    let notes = input
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let mut tx = pool.begin().await?;

    // 1. The drive, if given, must be the caller's
    if let Some(drive_id) = input.drive_session_id {
        let owner: Option<Uuid> = sqlx::query_scalar(queries::SELECT_DRIVE_OWNER)
            .bind(drive_id)
            .fetch_optional(&mut *tx)
            .await?;
        if owner != Some(user_id) {
            return Err(ApiError::not_found("Drive not found"));
        }
    }

    // 2. Species must exist
    let species_exists: bool = sqlx::query_scalar(queries::SPECIES_EXISTS)
        .bind(input.species_id)
        .fetch_one(&mut *tx)
        .await?;
    if !species_exists {
        return Err(ApiError::not_found("Species not found"));
    }

    // 3. Insert sighting
    let sighting = sqlx::query_as::<_, Sighting>(queries::INSERT_SIGHTING)
        .bind(user_id)
        .bind(input.drive_session_id)
        .bind(input.species_id)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.count)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

    // 4. Mark checklist
    sqlx::query_as::<_, ChecklistItem>(queries::UPSERT_CHECKLIST_FROM_SIGHTING)
        .bind(user_id)
        .bind(input.species_id)
        .bind(input.latitude)
        .bind(input.longitude)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        "Recorded sighting {} of species {} by user {}",
        sighting.id, sighting.species_id, user_id
    );
    Ok(sighting)
}

pub async fn recent_sightings(pool: &DbPool, limit: Option<i64>) -> ApiResult<Vec<SightingView>> {
    let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT).clamp(1, MAX_RECENT_LIMIT);

    let sightings = sqlx::query_as::<_, SightingView>(queries::SELECT_RECENT_SIGHTINGS)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(sightings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sighting_defaults() {
        let input: NewSighting = serde_json::from_str(
            r#"{"speciesId":"0d5b8c3e-7f3c-4b8a-9f51-2b6f0b3f7d11","latitude":-24.25,"longitude":31.15}"#,
        )
        .unwrap();
        assert_eq!(input.count, 1);
        assert_eq!(input.drive_session_id, None);
        assert_eq!(input.notes, None);
    }
}
