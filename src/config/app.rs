use anyhow::Result;

use super::{env_or, env_or_else};

const DEV_JWT_SECRET: &str = "change-me-in-production";

/// Backend API configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub jwt_secret: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env_or_else("HOST", "0.0.0.0"),
            port: env_or("PORT", 8002),
            environment: env_or_else("ENVIRONMENT", "development"),
            jwt_secret: env_or_else("JWT_SECRET", DEV_JWT_SECRET),
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Auth microservice configuration. JWT_SECRET must match the backend's so
/// tokens issued here validate there.
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
}

impl AuthServiceConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env_or_else("AUTH_HOST", "0.0.0.0"),
            port: env_or("AUTH_PORT", 8005),
            jwt_secret: env_or_else("JWT_SECRET", DEV_JWT_SECRET),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
