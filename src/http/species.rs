use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::processor::catalog_processor::{self, NewSpecies};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/species")
            .route("", web::get().to(all_species))
            .route("", web::post().to(create_species))
            .route("/categories", web::get().to(categories))
            .route("/category/{category}", web::get().to(by_category))
            .route("/search", web::get().to(search)),
    );
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    query: String,
}

async fn all_species(state: web::Data<AppState>, _user: CurrentUser) -> ApiResult<HttpResponse> {
    let species = catalog_processor::all_species(&state.pool).await?;
    Ok(HttpResponse::Ok().json(species))
}

async fn categories(state: web::Data<AppState>, _user: CurrentUser) -> ApiResult<HttpResponse> {
    let categories = catalog_processor::categories(&state.pool).await?;
    Ok(HttpResponse::Ok().json(categories))
}

async fn by_category(
    state: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let species = catalog_processor::species_by_category(&state.pool, &path).await?;
    Ok(HttpResponse::Ok().json(species))
}

async fn search(
    state: web::Data<AppState>,
    _user: CurrentUser,
    query: web::Query<SearchQuery>,
) -> ApiResult<HttpResponse> {
    if query.query.trim().is_empty() {
        return Ok(HttpResponse::Ok().json(Vec::<()>::new()));
    }
    let species = catalog_processor::search_species(&state.pool, &query.query).await?;
    Ok(HttpResponse::Ok().json(species))
}

async fn create_species(
    state: web::Data<AppState>,
    _user: CurrentUser,
    body: web::Json<NewSpecies>,
) -> ApiResult<HttpResponse> {
    let species = catalog_processor::create_species(&state.pool, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(species))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    use crate::auth::USER_ID_HEADER;
    use crate::http::configure;
    use crate::http::test_support::{error_message, state, USER};

    #[actix_web::test]
    async fn test_blank_search_is_empty() {
        let (state, config) = state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(|cfg| configure(cfg, &config)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/species/search?query=%20%20")
            .insert_header((USER_ID_HEADER, USER))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, serde_json::json!([]));
    }

    #[actix_web::test]
    async fn test_species_needs_common_name() {
        let (state, config) = state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(|cfg| configure(cfg, &config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/species")
            .insert_header((USER_ID_HEADER, USER))
            .set_json(serde_json::json!({ "commonName": " ", "category": "Mammal" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_message(resp).await,
            "commonName and category are required"
        );
    }
}
