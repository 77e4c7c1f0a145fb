use actix_web::{web, HttpResponse};

use super::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::processor::user_processor::{self, UpdateProfile};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users").service(
            web::resource("/me")
                .route(web::get().to(me))
                .route(web::patch().to(update_me)),
        ),
    );
}

async fn me(state: web::Data<AppState>, user: CurrentUser) -> ApiResult<HttpResponse> {
    let profile = user_processor::profile(&state.pool, user.id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

async fn update_me(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<UpdateProfile>,
) -> ApiResult<HttpResponse> {
    let profile = user_processor::update_profile(&state.pool, user.id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}
