use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trainforge::api::routes::create_routes;
use trainforge::config::{run_migrations, AppConfig, DatabaseConfig};
use trainforge::services::StorageService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let db_config = DatabaseConfig::from_env()?;

    let db = db_config.create_pool().await?;
    run_migrations(&db).await?;

    let storage_service = match StorageService::from_env().await {
        Some(service) => Some(Arc::new(service)),
        None => {
            info!("Object storage not configured, photo uploads disabled");
            None
        }
    };

    let app = create_routes(db, &config.jwt_secret, storage_service);

    let listener = TcpListener::bind(config.server_address()).await?;
    info!("Trainforge API listening on http://{}", config.server_address());

    axum::serve(listener, app).await?;

    Ok(())
}
