use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AppConfig;
use crate::db::{queries, DbPool};
use crate::error::{ApiError, ApiResult};
use crate::models::settings::{
    setting_value, AppSetting, STRAVA_CLIENT_ID_KEY, STRAVA_CLIENT_SECRET_KEY,
};
use crate::strava::{StravaCredentials, StravaError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StravaSettings {
    pub client_id: String,
    pub client_secret: String,
    pub configured: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStravaSettings {
    pub client_id: String,
    pub client_secret: String,
}

async fn strava_rows(pool: &DbPool) -> Result<Vec<AppSetting>, sqlx::Error> {
    let keys = vec![
        STRAVA_CLIENT_ID_KEY.to_string(),
        STRAVA_CLIENT_SECRET_KEY.to_string(),
    ];
    sqlx::query_as::<_, AppSetting>(queries::SELECT_SETTINGS)
        .bind(keys)
        .fetch_all(pool)
        .await
}

pub async fn strava_settings(pool: &DbPool) -> ApiResult<StravaSettings> {
    let rows = strava_rows(pool).await?;
    let client_id = setting_value(&rows, STRAVA_CLIENT_ID_KEY).unwrap_or_default();
    let client_secret = setting_value(&rows, STRAVA_CLIENT_SECRET_KEY).unwrap_or_default();

    Ok(StravaSettings {
        configured: !client_id.is_empty() && !client_secret.is_empty(),
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
    })
}

pub async fn set_strava_settings(pool: &DbPool, input: UpdateStravaSettings) -> ApiResult<()> {
    let client_id = input.client_id.trim();
    let client_secret = input.client_secret.trim();
    if client_id.is_empty() || client_secret.is_empty() {
        return Err(ApiError::bad_request(
            "clientId and clientSecret are required",
        ));
    }

    let mut tx = pool.begin().await?;
    for (key, value) in [
        (STRAVA_CLIENT_ID_KEY, client_id),
        (STRAVA_CLIENT_SECRET_KEY, client_secret),
    ] {
        sqlx::query(queries::UPSERT_SETTING)
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    info!("Strava client credentials updated");
    Ok(())
}

/// Credentials stored by an admin win over the environment.
pub fn resolve_credentials(
    rows: &[AppSetting],
    config: &AppConfig,
) -> Result<StravaCredentials, StravaError> {
    if let (Some(client_id), Some(client_secret)) = (
        setting_value(rows, STRAVA_CLIENT_ID_KEY),
        setting_value(rows, STRAVA_CLIENT_SECRET_KEY),
    ) {
        return Ok(StravaCredentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        });
    }

    match (&config.strava_client_id, &config.strava_client_secret) {
        (Some(client_id), Some(client_secret)) => Ok(StravaCredentials {
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
        }),
        _ => Err(StravaError::MissingCredentials),
    }
}

pub async fn strava_credentials(pool: &DbPool, config: &AppConfig) -> ApiResult<StravaCredentials> {
    let rows = strava_rows(pool).await?;
    Ok(resolve_credentials(&rows, config)?)
}
