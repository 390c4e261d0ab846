use anyhow::Result;
use std::env;
use std::time::Duration;

/// Gateway configuration: a path-prefix routing table plus client limits.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    routes: Vec<(String, String)>,
}

impl GatewayConfig {
    /// Routes are matched longest-prefix-first, so `/api/v1/auth` wins over
    /// `/api/v1` regardless of insertion order.
    pub fn new(host: String, port: u16, mut routes: Vec<(String, String)>) -> Self {
        routes.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));
        Self {
            host,
            port,
            request_timeout: Duration::from_secs(30),
            routes,
        }
    }

    pub fn from_env() -> Result<Self> {
        let host = env::var("GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("GATEWAY_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()?;

        let auth_service_url =
            env::var("AUTH_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8005".to_string());
        let backend_service_url =
            env::var("BACKEND_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8002".to_string());

        let mut config = Self::new(
            host,
            port,
            vec![
                ("/api/v1/auth".to_string(), auth_service_url),
                ("/api/v1".to_string(), backend_service_url),
            ],
        );

        if let Ok(timeout_secs) = env::var("GATEWAY_REQUEST_TIMEOUT") {
            if let Ok(secs) = timeout_secs.parse() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        Ok(config)
    }

    /// The upstream base URL for a request path, if any prefix matches.
    pub fn target_for(&self, path: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(_, url)| url.as_str())
    }

    pub fn routes(&self) -> &[(String, String)] {
        &self.routes
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig::new(
            "127.0.0.1".to_string(),
            8000,
            vec![
                ("/api/v1".to_string(), "http://backend:8002".to_string()),
                ("/api/v1/auth".to_string(), "http://auth:8005".to_string()),
            ],
        )
    }

    #[test]
    fn test_longest_prefix_wins() {
        let config = config();
        assert_eq!(
            config.target_for("/api/v1/auth/login"),
            Some("http://auth:8005")
        );
        assert_eq!(
            config.target_for("/api/v1/training/abc"),
            Some("http://backend:8002")
        );
    }

    #[test]
    fn test_unmatched_path_has_no_target() {
        let config = config();
        assert_eq!(config.target_for("/metrics"), None);
        assert_eq!(config.target_for("/api/v2/training"), None);
    }
}
