pub mod config;
pub mod handlers;
pub mod models;

pub use config::ApiConfig;

use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use std::fs;
use tracing::{info, instrument};

use crate::tasks::TaskRegistry;

/// Registers every route on an actix app; shared between the server and
/// the endpoint tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(handlers::index)))
        .service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(web::resource("/api/screenshot").route(web::post().to(handlers::start_screenshot)))
        .service(web::resource("/api/status/{task_id}").route(web::get().to(handlers::get_status)))
        .service(web::resource("/api/log/{task_id}").route(web::get().to(handlers::get_log)))
        .service(
            web::resource("/api/screenshots/{task_id}")
                .route(web::get().to(handlers::list_screenshots)),
        )
        .service(
            web::resource("/api/screenshots/{task_id}/{filename}")
                .route(web::get().to(handlers::get_screenshot)),
        )
        .service(
            web::resource("/api/download/{task_id}/{filename}")
                .route(web::get().to(handlers::download_screenshot)),
        )
        .service(
            web::resource("/api/download-all/{task_id}")
                .route(web::get().to(handlers::download_all)),
        );
}

/// Starts the dashboard server with the specified configuration
#[instrument(skip(config))]
pub async fn start_server(host: &str, port: u16, config: ApiConfig) -> Result<()> {
    info!("Starting sitemap screenshot server on {}:{}", host, port);

    fs::create_dir_all(&config.screenshot_dir).with_context(|| {
        format!("Failed to create screenshot directory: {}", config.screenshot_dir.display())
    })?;

    let registry = TaskRegistry::new();
    let config_data = web::Data::new(config);
    let registry_data = web::Data::new(registry);

    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(registry_data.clone())
            .wrap(
                middleware::DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*")),
            )
            .configure(routes)
    })
    .bind((host, port))
    .with_context(|| format!("Failed to bind to {}:{}", host, port))?
    .run()
    .await?;

    info!("Server shutdown complete");
    Ok(())
}
