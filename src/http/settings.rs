use actix_web::{web, HttpResponse};
use serde_json::json;

use super::AppState;
use crate::auth::{AdminUser, CurrentUser};
use crate::error::ApiResult;
use crate::processor::settings_processor::{self, UpdateStravaSettings};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/settings/strava")
            .route("", web::get().to(strava_settings))
            .route("", web::put().to(update_strava_settings))
            .route("/configured", web::get().to(strava_configured)),
    );
}

async fn strava_settings(state: web::Data<AppState>, _admin: AdminUser) -> ApiResult<HttpResponse> {
    let settings = settings_processor::strava_settings(&state.pool).await?;
    Ok(HttpResponse::Ok().json(settings))
}

async fn update_strava_settings(
    state: web::Data<AppState>,
    _admin: AdminUser,
    body: web::Json<UpdateStravaSettings>,
) -> ApiResult<HttpResponse> {
    settings_processor::set_strava_settings(&state.pool, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

async fn strava_configured(
    state: web::Data<AppState>,
    _user: CurrentUser,
) -> ApiResult<HttpResponse> {
    let settings = settings_processor::strava_settings(&state.pool).await?;
    Ok(HttpResponse::Ok().json(json!({ "configured": settings.configured })))
}
