use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::{has_extension, AppState};
use crate::auth::AdminUser;
use crate::error::{ApiError, ApiResult};
use crate::processor::roads_processor;

pub fn routes(cfg: &mut web::ServiceConfig, upload_limit: usize) {
    cfg.service(
        web::resource("/roads")
            .app_data(web::PayloadConfig::new(upload_limit))
            .route(web::post().to(upload_roads)),
    );
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    filename: Option<String>,
}

async fn upload_roads(
    state: web::Data<AppState>,
    _admin: AdminUser,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    if body.is_empty() {
        return Err(ApiError::bad_request("No file provided"));
    }
    if !has_extension(query.filename.as_deref(), ".geojson") {
        return Err(ApiError::bad_request("File must be a .geojson file"));
    }

    let feature_count =
        roads_processor::save_road_network(&state.config.roads_output_path, &body).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "featureCount": feature_count })))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    use crate::auth::{USER_ID_HEADER, USER_ROLE_HEADER};
    use crate::http::configure;
    use crate::http::test_support::{error_message, state, USER};

    #[actix_web::test]
    async fn test_roads_upload_is_admin_only() {
        let (state, config) = state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(|cfg| configure(cfg, &config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/roads?filename=roads.geojson")
            .insert_header((USER_ID_HEADER, USER))
            .set_payload(r#"{"type":"FeatureCollection","features":[]}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_roads_upload_rejects_non_collection() {
        let (state, config) = state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(|cfg| configure(cfg, &config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/roads?filename=roads.geojson")
            .insert_header((USER_ID_HEADER, USER))
            .insert_header((USER_ROLE_HEADER, "ADMIN"))
            .set_payload(r#"{"type":"Feature","geometry":null}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_message(resp).await,
            "File must be a GeoJSON FeatureCollection"
        );
    }

    #[actix_web::test]
    async fn test_roads_upload_needs_geojson_name() {
        let (state, config) = state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(|cfg| configure(cfg, &config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/roads?filename=roads.json")
            .insert_header((USER_ID_HEADER, USER))
            .insert_header((USER_ROLE_HEADER, "ADMIN"))
            .set_payload(r#"{"type":"FeatureCollection","features":[]}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
