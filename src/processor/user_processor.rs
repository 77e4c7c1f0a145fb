use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::db::{queries, DbPool};
use crate::error::{ApiError, ApiResult};
use crate::models::user::{DistanceUnit, UserProfile, UserRow};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub distance_unit: Option<DistanceUnit>,
}

/// Trimmed and checked fields, ready to bind.
#[derive(Debug, PartialEq)]
struct ProfileChanges {
    name: Option<String>,
    email: Option<String>,
    distance_unit: Option<DistanceUnit>,
}

fn validate(input: UpdateProfile) -> ApiResult<ProfileChanges> {
    let name = match input.name {
        Some(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(ApiError::bad_request("Name must not be empty"));
            }
            Some(name.to_string())
        }
        None => None,
    };
    let email = match input.email {
        Some(email) => {
            let email = email.trim();
            if !EMAIL_RE.is_match(email) {
                return Err(ApiError::bad_request("Invalid email address"));
            }
            Some(email.to_string())
        }
        None => None,
    };
    Ok(ProfileChanges {
        name,
        email,
        distance_unit: input.distance_unit,
    })
}

pub async fn profile(pool: &DbPool, user_id: Uuid) -> ApiResult<UserProfile> {
    sqlx::query_as::<_, UserRow>(queries::SELECT_USER_PROFILE)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .map(UserProfile::from)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn update_profile(
    pool: &DbPool,
    user_id: Uuid,
    input: UpdateProfile,
) -> ApiResult<UserProfile> {
    let changes = validate(input)?;

    let mut tx = pool.begin().await?;

    // 1. Name and email must not belong to anyone else
    if let Some(name) = &changes.name {
        let taken: bool = sqlx::query_scalar(queries::USER_NAME_TAKEN)
            .bind(name)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        if taken {
            return Err(ApiError::Conflict("That name is already taken".to_string()));
        }
    }
    if let Some(email) = &changes.email {
        let taken: bool = sqlx::query_scalar(queries::USER_EMAIL_TAKEN)
            .bind(email)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        if taken {
            return Err(ApiError::Conflict("That email is already in use".to_string()));
        }
    }

    // 2. Write
    let updated = sqlx::query(queries::UPDATE_USER_PROFILE)
        .bind(user_id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.distance_unit.map(|u| u.as_str()))
        .execute(&mut *tx)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    tx.commit().await?;
    info!("Updated profile of user {}", user_id);

    profile(pool, user_id).await
}
