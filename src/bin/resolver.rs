use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;

use vaultlink::api::{RedirectService, redirect_routes};
use vaultlink::config::{get_config, init_config};
use vaultlink::services::Shortener;
use vaultlink::storage::{Storage, StorageFactory};
use vaultlink::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_config();
    let config = get_config();
    let _log_guard = init_logging(&config.logging);

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage")?;
    info!("Using storage backend: {}", storage.backend_name().await);

    let shortener = Arc::new(Shortener::from_config(&config.shortener));

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting resolver at http://{}", bind_address);

    let storage_data = web::Data::new(storage);
    let shortener_data = web::Data::new(shortener);

    HttpServer::new(move || {
        App::new()
            .app_data(storage_data.clone())
            .app_data(shortener_data.clone())
            .service(redirect_routes())
            .default_service(web::to(RedirectService::not_found))
    })
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}
