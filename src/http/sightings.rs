use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::processor::sighting_processor::{self, NewSighting};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sightings")
            .route("", web::post().to(create_sighting))
            .route("/recent", web::get().to(recent_sightings)),
    );
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<i64>,
}

async fn create_sighting(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<NewSighting>,
) -> ApiResult<HttpResponse> {
    let sighting = sighting_processor::create_sighting(&state.pool, user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(sighting))
}

async fn recent_sightings(
    state: web::Data<AppState>,
    _user: CurrentUser,
    query: web::Query<RecentQuery>,
) -> ApiResult<HttpResponse> {
    let sightings = sighting_processor::recent_sightings(&state.pool, query.limit).await?;
    Ok(HttpResponse::Ok().json(sightings))
}
