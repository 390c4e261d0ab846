pub mod app;
pub mod database;

pub use app::{AppConfig, AuthServiceConfig};
pub use database::{run_migrations, DatabaseConfig};

/// Read an env var and parse it, falling back to `default` when the variable
/// is unset or unparseable.
pub(crate) fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_or_else(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
