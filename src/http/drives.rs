use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use super::{has_extension, AppState};
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::processor::drive_processor;
use crate::track::TrackPoint;

pub fn routes(cfg: &mut web::ServiceConfig, gpx_limit: usize) {
    cfg.service(
        web::scope("/drives")
            .route("", web::get().to(list_drives))
            .route("/start", web::post().to(start_drive))
            .route("/active", web::get().to(active_drive))
            .service(
                web::resource("/gpx")
                    .app_data(web::PayloadConfig::new(gpx_limit))
                    .route(web::post().to(upload_gpx)),
            )
            .route("/{id}", web::get().to(drive_detail))
            .route("/{id}/points", web::post().to(add_points))
            .route("/{id}/end", web::post().to(end_drive)),
    );
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PointsBatch {
    points: Vec<TrackPoint>,
}

#[derive(Debug, Default, Deserialize)]
struct EndDrive {
    #[serde(default)]
    points: Vec<TrackPoint>,
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    filename: Option<String>,
}

async fn start_drive(state: web::Data<AppState>, user: CurrentUser) -> ApiResult<HttpResponse> {
    let drive = drive_processor::start_drive(&state.pool, &user).await?;
    Ok(HttpResponse::Ok().json(drive))
}

async fn active_drive(state: web::Data<AppState>, user: CurrentUser) -> ApiResult<HttpResponse> {
    let drive = drive_processor::active_drive(&state.pool, user.id).await?;
    Ok(HttpResponse::Ok().json(drive))
}

async fn add_points(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<PointsBatch>,
) -> ApiResult<HttpResponse> {
    let drive_id = path.into_inner();
    let batch = body.into_inner();
    let count =
        drive_processor::add_route_points(&state.pool, user.id, drive_id, batch.points).await?;
    Ok(HttpResponse::Ok().json(json!({ "pointCount": count })))
}

async fn end_drive(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    body: Option<web::Json<EndDrive>>,
) -> ApiResult<HttpResponse> {
    let drive_id = path.into_inner();
    let final_points = body.map(|b| b.into_inner()).unwrap_or_default().points;
    let drive = drive_processor::end_drive(&state.pool, user.id, drive_id, final_points).await?;
    Ok(HttpResponse::Ok().json(drive))
}

async fn list_drives(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<ListQuery>,
) -> ApiResult<HttpResponse> {
    let drives = drive_processor::list_drives(&state.pool, user.id, query.limit).await?;
    Ok(HttpResponse::Ok().json(drives))
}

async fn drive_detail(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let drive = drive_processor::drive_detail(&state.pool, user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(drive))
}

/// Raw GPX document in the body, original file name in `?filename=`.
async fn upload_gpx(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    if body.is_empty() {
        return Err(ApiError::bad_request("No GPX file provided"));
    }
    if !has_extension(query.filename.as_deref(), ".gpx") {
        warn!("Rejected GPX upload {:?} from user {}", query.filename, user.id);
        return Err(ApiError::bad_request("File must be a .gpx file"));
    }
    let document = std::str::from_utf8(&body)
        .map_err(|_| ApiError::bad_request("GPX file must be UTF-8 text"))?;

    let drive_id = drive_processor::import_gpx(&state.pool, &user, document).await?;
    Ok(HttpResponse::Ok().json(json!({ "driveId": drive_id })))
}
