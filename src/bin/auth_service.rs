use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trainforge::api::auth::auth_routes;
use trainforge::api::health::health_check;
use trainforge::auth::AuthService;
use trainforge::config::{AuthServiceConfig, DatabaseConfig};
use trainforge::services::{EmailService, SmtpConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AuthServiceConfig::from_env()?;
    let db = DatabaseConfig::from_env()?.create_pool().await?;

    let mut auth_service = AuthService::new(db, &config.jwt_secret);
    match SmtpConfig::from_env() {
        Some(smtp_config) => {
            auth_service = auth_service.with_email_service(Arc::new(EmailService::new(smtp_config)?));
        }
        None => info!("SMTP not configured, welcome emails disabled"),
    }

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/auth", auth_routes(auth_service));

    let listener = TcpListener::bind(config.server_address()).await?;
    info!("Trainforge auth service listening on http://{}", config.server_address());

    axum::serve(listener, app).await?;

    Ok(())
}
