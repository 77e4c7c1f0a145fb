use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

const MIB: usize = 1024 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub http_host: String,
    pub http_port: u16,
    pub public_url: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub strava_client_id: Option<String>,
    pub strava_client_secret: Option<String>,
    pub gpx_max_upload_bytes: usize,
    pub roads_max_upload_bytes: usize,
    pub roads_output_path: PathBuf,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let http_host = env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let http_port = parse_or("HTTP_PORT", 3000);
        let public_url = env::var("PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let database_url = match env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => {
                let db_host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
                let db_port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
                let db_name = env::var("DB_DATABASE").unwrap_or_else(|_| "safari_track".to_string());
                let db_user = env::var("DB_USER").unwrap_or_else(|_| "safari".to_string());
                let db_pwd = env::var("DB_PWD").unwrap_or_else(|_| "safari".to_string());

                format!(
                    "postgres://{}:{}@{}:{}/{}",
                    db_user, db_pwd, db_host, db_port, db_name
                )
            }
        };
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 10);

        // Blank values count as unset.
        let strava_client_id = env::var("STRAVA_CLIENT_ID").ok().filter(|s| !s.is_empty());
        let strava_client_secret = env::var("STRAVA_CLIENT_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let gpx_max_upload_bytes = parse_or("GPX_MAX_UPLOAD_BYTES", 10 * MIB);
        let roads_max_upload_bytes = parse_or("ROADS_MAX_UPLOAD_BYTES", 20 * MIB);
        let roads_output_path = env::var("ROADS_OUTPUT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public/data/roads.geojson"));

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            http_host,
            http_port,
            public_url,
            database_url,
            db_max_connections,
            strava_client_id,
            strava_client_secret,
            gpx_max_upload_bytes,
            roads_max_upload_bytes,
            roads_output_path,
            log_level,
        })
    }

    pub fn strava_redirect_uri(&self) -> String {
        format!("{}/api/strava/callback", self.public_url)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
