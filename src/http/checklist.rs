use actix_web::{web, HttpResponse};

use super::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::processor::checklist_processor::{
    self, ChecklistFilter, MarkSpotted, ToggleSpotted,
};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/checklist")
            .route("", web::get().to(my_checklist))
            .route("/toggle", web::post().to(toggle_spotted))
            .route("/mark", web::post().to(mark_spotted))
            .route("/stats", web::get().to(stats)),
    );
}

async fn my_checklist(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<ChecklistFilter>,
) -> ApiResult<HttpResponse> {
    let entries = checklist_processor::my_checklist(&state.pool, user.id, query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(entries))
}

async fn toggle_spotted(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<ToggleSpotted>,
) -> ApiResult<HttpResponse> {
    let item = checklist_processor::toggle_spotted(&state.pool, user.id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(item))
}

async fn mark_spotted(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<MarkSpotted>,
) -> ApiResult<HttpResponse> {
    let item =
        checklist_processor::mark_from_sighting(&state.pool, user.id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(item))
}

async fn stats(state: web::Data<AppState>, user: CurrentUser) -> ApiResult<HttpResponse> {
    let stats = checklist_processor::stats(&state.pool, user.id).await?;
    Ok(HttpResponse::Ok().json(stats))
}
