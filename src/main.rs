mod auth;
mod config;
mod db;
mod error;
mod http;
mod models;
mod processor;
mod strava;
mod track;

use actix_web::{middleware, web, App, HttpServer};
use config::AppConfig;
use strava::StravaClient;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting Safari Track API...");

    // Init DB
    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;
    info!("Connected to database");

    let state = web::Data::new(http::AppState {
        pool,
        config: config.clone(),
        strava: StravaClient::new()?,
    });

    // Serve
    let bind = (config.http_host.clone(), config.http_port);
    info!("Listening on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(|cfg| http::configure(cfg, &config))
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
