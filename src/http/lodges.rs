use actix_web::{web, HttpResponse};

use super::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::processor::catalog_processor;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/lodges")
            .route("", web::get().to(lodges))
            .route("/mine", web::get().to(my_lodge)),
    );
}

async fn lodges(state: web::Data<AppState>, _user: CurrentUser) -> ApiResult<HttpResponse> {
    let lodges = catalog_processor::lodges(&state.pool).await?;
    Ok(HttpResponse::Ok().json(lodges))
}

async fn my_lodge(state: web::Data<AppState>, user: CurrentUser) -> ApiResult<HttpResponse> {
    let lodge = catalog_processor::lodge(&state.pool, user.lodge_id).await?;
    Ok(HttpResponse::Ok().json(lodge))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    use crate::auth::USER_ID_HEADER;
    use crate::http::configure;
    use crate::http::test_support::{state, USER};

    #[actix_web::test]
    async fn test_no_lodge_assigned() {
        let (state, config) = state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(|cfg| configure(cfg, &config)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/lodges/mine")
            .insert_header((USER_ID_HEADER, USER))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
