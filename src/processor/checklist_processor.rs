use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::db::{queries, DbPool};
use crate::error::{ApiError, ApiResult};
use crate::models::checklist::{CategoryStats, ChecklistEntry, ChecklistItem, ChecklistStats};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistFilter {
    pub category: Option<String>,
    #[serde(default)]
    pub spotted_only: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSpotted {
    pub species_id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkSpotted {
    pub species_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
}

/// Mutable part of a checklist item.
#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistState {
    pub spotted: bool,
    pub sighting_count: i32,
    pub first_spotted_at: Option<DateTime<Utc>>,
    pub last_latitude: Option<f64>,
    pub last_longitude: Option<f64>,
}

impl ChecklistState {
    pub fn first_spotting(latitude: Option<f64>, longitude: Option<f64>, now: DateTime<Utc>) -> Self {
        Self {
            spotted: true,
            sighting_count: 1,
            first_spotted_at: Some(now),
            last_latitude: latitude,
            last_longitude: longitude,
        }
    }

    /// Flip spotted. Un-spotting keeps the count and clears the first-spotted time;
    /// re-spotting counts one more sighting.
    pub fn toggled(&self, latitude: Option<f64>, longitude: Option<f64>, now: DateTime<Utc>) -> Self {
        let spotted = !self.spotted;
        Self {
            spotted,
            sighting_count: if spotted {
                self.sighting_count + 1
            } else {
                self.sighting_count
            },
            first_spotted_at: if spotted {
                self.first_spotted_at.or(Some(now))
            } else {
                None
            },
            last_latitude: latitude.or(self.last_latitude),
            last_longitude: longitude.or(self.last_longitude),
        }
    }
}

impl From<&ChecklistItem> for ChecklistState {
    fn from(item: &ChecklistItem) -> Self {
        Self {
            spotted: item.spotted,
            sighting_count: item.sighting_count,
            first_spotted_at: item.first_spotted_at,
            last_latitude: item.last_latitude,
            last_longitude: item.last_longitude,
        }
    }
}

pub async fn my_checklist(
    pool: &DbPool,
    user_id: Uuid,
    filter: ChecklistFilter,
) -> ApiResult<Vec<ChecklistEntry>> {
    let category = filter.category.filter(|c| !c.trim().is_empty());

    let entries = sqlx::query_as::<_, ChecklistEntry>(queries::SELECT_CHECKLIST)
        .bind(user_id)
        .bind(category)
        .fetch_all(pool)
        .await?;

    if filter.spotted_only {
        return Ok(entries.into_iter().filter(|e| e.spotted).collect());
    }
    Ok(entries)
}

pub async fn toggle_spotted(
    pool: &DbPool,
    user_id: Uuid,
    input: ToggleSpotted,
) -> ApiResult<ChecklistItem> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let existing = sqlx::query_as::<_, ChecklistItem>(queries::SELECT_CHECKLIST_ITEM_FOR_UPDATE)
        .bind(user_id)
        .bind(input.species_id)
        .fetch_optional(&mut *tx)
        .await?;

    let item = match existing {
        Some(item) => {
            let next = ChecklistState::from(&item).toggled(input.latitude, input.longitude, now);
            sqlx::query_as::<_, ChecklistItem>(queries::UPDATE_CHECKLIST_ITEM)
                .bind(item.id)
                .bind(next.spotted)
                .bind(next.sighting_count)
                .bind(next.first_spotted_at)
                .bind(next.last_latitude)
                .bind(next.last_longitude)
                .fetch_one(&mut *tx)
                .await?
        }
        None => {
            let species_exists: bool = sqlx::query_scalar(queries::SPECIES_EXISTS)
                .bind(input.species_id)
                .fetch_one(&mut *tx)
                .await?;
            if !species_exists {
                return Err(ApiError::not_found("Species not found"));
            }

            let next = ChecklistState::first_spotting(input.latitude, input.longitude, now);
            sqlx::query_as::<_, ChecklistItem>(queries::INSERT_CHECKLIST_ITEM)
                .bind(user_id)
                .bind(input.species_id)
                .bind(next.spotted)
                .bind(next.sighting_count)
                .bind(next.first_spotted_at)
                .bind(next.last_latitude)
                .bind(next.last_longitude)
                .fetch_one(&mut *tx)
                .await?
        }
    };

    tx.commit().await?;

    info!(
        "User {} marked species {} as {}",
        user_id,
        item.species_id,
        if item.spotted { "spotted" } else { "not spotted" }
    );
    Ok(item)
}

pub async fn mark_from_sighting(
    pool: &DbPool,
    user_id: Uuid,
    input: MarkSpotted,
) -> ApiResult<ChecklistItem> {
    let species_exists: bool = sqlx::query_scalar(queries::SPECIES_EXISTS)
        .bind(input.species_id)
        .fetch_one(pool)
        .await?;
    if !species_exists {
        return Err(ApiError::not_found("Species not found"));
    }

    let item = sqlx::query_as::<_, ChecklistItem>(queries::UPSERT_CHECKLIST_FROM_SIGHTING)
        .bind(user_id)
        .bind(input.species_id)
        .bind(input.latitude)
        .bind(input.longitude)
        .fetch_one(pool)
        .await?;
    Ok(item)
}

pub async fn stats(pool: &DbPool, user_id: Uuid) -> ApiResult<ChecklistStats> {
    let totals: Vec<(String, i64)> = sqlx::query_as(queries::COUNT_SPECIES_BY_CATEGORY)
        .fetch_all(pool)
        .await?;
    let spotted: Vec<(String, i64)> = sqlx::query_as(queries::COUNT_SPOTTED_BY_CATEGORY)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(summarize(totals, spotted))
}

/// Fold per-category totals and spotted counts into overall stats, categories sorted by name.
pub fn summarize(totals: Vec<(String, i64)>, spotted: Vec<(String, i64)>) -> ChecklistStats {
    let spotted_by_category: BTreeMap<String, i64> = spotted.into_iter().collect();
    let totals: BTreeMap<String, i64> = totals.into_iter().collect();

    let categories: Vec<CategoryStats> = totals
        .into_iter()
        .map(|(category, total)| CategoryStats {
            spotted: spotted_by_category.get(&category).copied().unwrap_or(0),
            category,
            total,
        })
        .collect();

    ChecklistStats {
        total: categories.iter().map(|c| c.total).sum(),
        spotted: categories.iter().map(|c| c.spotted).sum(),
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_first_spotting() {
        let state = ChecklistState::first_spotting(Some(-24.2), None, at(6));
        assert!(state.spotted);
        assert_eq!(state.sighting_count, 1);
        assert_eq!(state.first_spotted_at, Some(at(6)));
        assert_eq!(state.last_latitude, Some(-24.2));
        assert_eq!(state.last_longitude, None);
    }

    #[test]
    fn test_unspot_keeps_count_and_clears_first_seen() {
        let spotted = ChecklistState::first_spotting(Some(-24.2), Some(31.1), at(6));
        let unspotted = spotted.toggled(None, None, at(7));

        assert!(!unspotted.spotted);
        assert_eq!(unspotted.sighting_count, 1);
        assert_eq!(unspotted.first_spotted_at, None);
        assert_eq!(unspotted.last_latitude, Some(-24.2));
        assert_eq!(unspotted.last_longitude, Some(31.1));
    }

    #[test]
    fn test_respot_counts_again() {
        let unspotted = ChecklistState {
            spotted: false,
            sighting_count: 3,
            first_spotted_at: None,
            last_latitude: Some(1.0),
            last_longitude: Some(2.0),
        };
        let respotted = unspotted.toggled(Some(5.0), Some(6.0), at(9));

        assert!(respotted.spotted);
        assert_eq!(respotted.sighting_count, 4);
        assert_eq!(respotted.first_spotted_at, Some(at(9)));
        assert_eq!(respotted.last_latitude, Some(5.0));
        assert_eq!(respotted.last_longitude, Some(6.0));
    }

    #[test]
    fn test_summarize_categories() {
        let stats = summarize(
            vec![
                ("Mammal".to_string(), 40),
                ("Bird".to_string(), 120),
                ("Reptile".to_string(), 15),
            ],
            vec![("Mammal".to_string(), 12), ("Bird".to_string(), 3)],
        );

        assert_eq!(stats.total, 175);
        assert_eq!(stats.spotted, 15);
        let names: Vec<&str> = stats.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Bird", "Mammal", "Reptile"]);
        assert_eq!(
            stats.categories[2],
            CategoryStats {
                category: "Reptile".to_string(),
                total: 15,
                spotted: 0
            }
        );
    }

    #[test]
    fn test_filter_query_defaults() {
        let filter: ChecklistFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter.category, None);
        assert!(!filter.spotted_only);
    }
}
