use actix_web::http::header;
use actix_web::{web, HttpResponse};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use super::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::processor::settings_processor::strava_credentials;
use crate::processor::strava_processor;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/strava")
            .route("", web::delete().to(disconnect))
            .route("/connect", web::get().to(connect))
            .route("/callback", web::get().to(callback))
            .route("/status", web::get().to(status))
            .route("/activities", web::get().to(activities))
            .route("/activities/{id}/import", web::post().to(import_activity)),
    );
}

#[derive(Debug, Default, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivitiesQuery {
    page: Option<u32>,
    per_page: Option<u32>,
}

/// Send the browser to Strava's consent page; the user id rides along as `state`.
async fn connect(state: web::Data<AppState>, user: CurrentUser) -> ApiResult<HttpResponse> {
    let creds = strava_credentials(&state.pool, &state.config).await?;
    let location = state.strava.authorize_url(
        &creds.client_id,
        &state.config.strava_redirect_uri(),
        &user.id.to_string(),
    );
    Ok(redirect(&location))
}

async fn callback(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<CallbackQuery>,
) -> HttpResponse {
    let outcome = match check_callback(&query, user.id) {
        Ok(code) => strava_processor::link_account(
            &state.pool,
            &state.config,
            &state.strava,
            user.id,
            code,
        )
        .await
        .map_err(|e| {
            warn!("Strava token exchange failed for user {}: {}", user.id, e);
            "token_exchange_failed".to_string()
        }),
        Err(reason) => {
            warn!("Strava callback rejected for user {}: {}", user.id, reason);
            Err(reason)
        }
    };

    redirect(&strava_page(&state.config.public_url, outcome))
}

async fn status(state: web::Data<AppState>, user: CurrentUser) -> ApiResult<HttpResponse> {
    let status = strava_processor::connection_status(&state.pool, user.id).await?;
    Ok(HttpResponse::Ok().json(status))
}

async fn activities(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<ActivitiesQuery>,
) -> ApiResult<HttpResponse> {
    let activities = strava_processor::activities(
        &state.pool,
        &state.config,
        &state.strava,
        user.id,
        query.page,
        query.per_page,
    )
    .await?;
    Ok(HttpResponse::Ok().json(activities))
}

async fn import_activity(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let drive_id = strava_processor::import_activity(
        &state.pool,
        &state.config,
        &state.strava,
        &user,
        path.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "driveId": drive_id })))
}

async fn disconnect(state: web::Data<AppState>, user: CurrentUser) -> ApiResult<HttpResponse> {
    strava_processor::disconnect(&state.pool, user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "disconnected": true })))
}

/// The authorization code, or the reason to bounce the user back.
fn check_callback(query: &CallbackQuery, user_id: Uuid) -> Result<&str, String> {
    if let Some(error) = query.error.as_deref().filter(|e| !e.is_empty()) {
        return Err(error.to_string());
    }
    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| "missing_code".to_string())?;
    if let Some(state) = query.state.as_deref() {
        if state != user_id.to_string() {
            return Err("state_mismatch".to_string());
        }
    }
    Ok(code)
}

fn strava_page(public_url: &str, outcome: Result<(), String>) -> String {
    let page = format!("{}/strava", public_url);
    let Ok(mut url) = Url::parse(&page) else {
        return "/strava".to_string();
    };
    match outcome {
        Ok(()) => url.query_pairs_mut().append_pair("connected", "true"),
        Err(reason) => url.query_pairs_mut().append_pair("error", &reason),
    };
    url.to_string()
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}
