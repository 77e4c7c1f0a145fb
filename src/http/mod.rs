//! HTTP surface: actix routes under `/api`, one module per resource.

use actix_web::web;
use tracing::warn;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::strava::StravaClient;

pub mod checklist;
pub mod drives;
pub mod lodges;
pub mod roads;
pub mod settings;
pub mod sightings;
pub mod species;
pub mod strava;
pub mod users;

const JSON_BODY_LIMIT: usize = 4 * 1024 * 1024;

/// Shared by every worker.
pub struct AppState {
    pub pool: DbPool,
    pub config: AppConfig,
    pub strava: StravaClient,
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &AppConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(
            web::scope("/api")
                .configure(|cfg| drives::routes(cfg, config.gpx_max_upload_bytes))
                .configure(sightings::routes)
                .configure(species::routes)
                .configure(checklist::routes)
                .configure(settings::routes)
                .configure(strava::routes)
                .configure(lodges::routes)
                .configure(users::routes)
                .configure(|cfg| roads::routes(cfg, config.roads_max_upload_bytes)),
        );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, req| {
            warn!("Rejected JSON body on {}: {}", req.path(), err);
            ApiError::bad_request(err.to_string()).into()
        })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| {
        warn!("Rejected query on {}: {}", req.path(), err);
        ApiError::bad_request(err.to_string()).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|_, _| ApiError::not_found("Not found").into())
}

/// Case-insensitive check of an uploaded file name's extension, e.g. `".gpx"`.
pub(crate) fn has_extension(filename: Option<&str>, extension: &str) -> bool {
    filename
        .map(|f| f.trim().to_ascii_lowercase().ends_with(extension))
        .unwrap_or(false)
}
