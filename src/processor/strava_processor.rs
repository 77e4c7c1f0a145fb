use chrono::Utc;
use futures::future::{join, try_join};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::config::AppConfig;
use crate::db::{queries, DbPool};
use crate::error::{ApiError, ApiResult};
use crate::models::strava_account::StravaAccount;
use crate::processor::drive_processor;
use crate::processor::settings_processor::strava_credentials;
use crate::strava::{
    activity_route, drive_photos, token_is_fresh, ActivitySummary, StravaClient, StravaError,
    TokenResponse, STRAVA_SCOPE,
};
use crate::track::MIN_TRACK_POINTS;

pub const DEFAULT_PER_PAGE: u32 = 30;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteView {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub athlete: Option<AthleteView>,
}

pub async fn connection_status(pool: &DbPool, user_id: Uuid) -> ApiResult<ConnectionStatus> {
    let account = find_account(pool, user_id).await?;

    Ok(match account {
        Some(a) => ConnectionStatus {
            connected: true,
            athlete: Some(AthleteView {
                id: a.athlete_id,
                first_name: a.first_name,
                last_name: a.last_name,
                profile_image_url: a.profile_image_url,
            }),
        },
        None => ConnectionStatus {
            connected: false,
            athlete: None,
        },
    })
}

/// Exchange an authorization code and link the athlete to the user.
pub async fn link_account(
    pool: &DbPool,
    config: &AppConfig,
    strava: &StravaClient,
    user_id: Uuid,
    code: &str,
) -> ApiResult<()> {
    let creds = strava_credentials(pool, config).await?;
    let token = strava.exchange_code(&creds, code).await?;
    let athlete = token
        .athlete
        .as_ref()
        .ok_or_else(|| ApiError::Upstream("Strava token response had no athlete".to_string()))?;

    sqlx::query(queries::UPSERT_STRAVA_ACCOUNT)
        .bind(user_id)
        .bind(athlete.id)
        .bind(&athlete.firstname)
        .bind(&athlete.lastname)
        .bind(&athlete.profile)
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(token.expires_at)
        .bind(STRAVA_SCOPE)
        .execute(pool)
        .await?;

    info!("Linked Strava athlete {} to user {}", athlete.id, user_id);
    Ok(())
}

pub async fn disconnect(pool: &DbPool, user_id: Uuid) -> ApiResult<()> {
    sqlx::query(queries::DELETE_STRAVA_ACCOUNT)
        .bind(user_id)
        .execute(pool)
        .await?;
    info!("Unlinked Strava account for user {}", user_id);
    Ok(())
}

/// A usable access token for the user, refreshing it when near expiry.
///
/// A failed refresh means the link is dead: the account is removed and `None` returned.
pub async fn access_token(
    pool: &DbPool,
    config: &AppConfig,
    strava: &StravaClient,
    user_id: Uuid,
) -> ApiResult<Option<String>> {
    let Some(account) = find_account(pool, user_id).await? else {
        return Ok(None);
    };

    if token_is_fresh(account.expires_at, Utc::now().timestamp()) {
        return Ok(Some(account.access_token));
    }

    let creds = strava_credentials(pool, config).await?;
    let refreshed: TokenResponse = match strava.refresh_token(&creds, &account.refresh_token).await {
        Ok(t) => t,
        Err(e) => {
            warn!("Strava token refresh failed for user {}: {}", user_id, e);
            disconnect(pool, user_id).await?;
            return Ok(None);
        }
    };

    sqlx::query(queries::UPDATE_STRAVA_TOKENS)
        .bind(user_id)
        .bind(&refreshed.access_token)
        .bind(&refreshed.refresh_token)
        .bind(refreshed.expires_at)
        .execute(pool)
        .await?;

    Ok(Some(refreshed.access_token))
}

pub async fn activities(
    pool: &DbPool,
    config: &AppConfig,
    strava: &StravaClient,
    user_id: Uuid,
    page: Option<u32>,
    per_page: Option<u32>,
) -> ApiResult<Vec<ActivitySummary>> {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);

    let token = require_token(pool, config, strava, user_id).await?;
    let result = strava.list_activities(&token, page, per_page).await;
    drop_on_unauthorized(pool, user_id, result).await
}

/// Create a finished drive from a Strava activity. Returns the new drive id.
pub async fn import_activity(
    pool: &DbPool,
    config: &AppConfig,
    strava: &StravaClient,
    user: &CurrentUser,
    activity_id: i64,
) -> ApiResult<Uuid> {
    let token = require_token(pool, config, strava, user.id).await?;

    let (fetched, photos) = join(
        try_join(
            strava.activity(&token, activity_id),
            strava.activity_streams(&token, activity_id),
        ),
        strava.activity_photos(&token, activity_id),
    )
    .await;
    let (activity, streams) = drop_on_unauthorized(pool, user.id, fetched).await?;

    let photos = match photos {
        Ok(p) => p,
        Err(e) => {
            warn!("Ignoring photos for activity {}: {}", activity_id, e);
            Vec::new()
        }
    };

    let route = activity_route(activity.start_date, &streams);
    if route.len() < MIN_TRACK_POINTS {
        return Err(ApiError::bad_request(
            "Activity has insufficient GPS data to create a drive.",
        ));
    }

    let drive_id = drive_processor::create_completed_drive(
        pool,
        user,
        route,
        drive_photos(photos),
        Some(activity.name),
    )
    .await?;

    info!(
        "Imported Strava activity {} as drive {} for user {}",
        activity_id, drive_id, user.id
    );
    Ok(drive_id)
}

async fn find_account(pool: &DbPool, user_id: Uuid) -> Result<Option<StravaAccount>, sqlx::Error> {
    sqlx::query_as::<_, StravaAccount>(queries::SELECT_STRAVA_ACCOUNT)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

async fn require_token(
    pool: &DbPool,
    config: &AppConfig,
    strava: &StravaClient,
    user_id: Uuid,
) -> ApiResult<String> {
    access_token(pool, config, strava, user_id)
        .await?
        .ok_or_else(|| {
            ApiError::PreconditionFailed(
                "No Strava account linked. Please connect your Strava account first.".to_string(),
            )
        })
}

/// A 401 from Strava means the user revoked access; forget the link before reporting it.
async fn drop_on_unauthorized<T>(
    pool: &DbPool,
    user_id: Uuid,
    result: Result<T, StravaError>,
) -> ApiResult<T> {
    match result {
        Ok(v) => Ok(v),
        Err(StravaError::Unauthorized) => {
            warn!("Strava rejected token for user {}, unlinking", user_id);
            disconnect(pool, user_id).await?;
            Err(StravaError::Unauthorized.into())
        }
        Err(e) => Err(e.into()),
    }
}
