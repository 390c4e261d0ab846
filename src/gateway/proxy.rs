use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tracing::{error, info};

use crate::gateway::GatewayConfig;

/// Request bodies are buffered before forwarding; anything larger is
/// rejected instead of truncated.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct GatewayState {
    client: reqwest::Client,
    config: Arc<GatewayConfig>,
}

/// Build the gateway router: `/health` and `/` are served locally, every
/// other path is proxied by prefix.
pub fn create_gateway(config: GatewayConfig) -> Result<Router> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    let state = GatewayState {
        client,
        config: Arc::new(config),
    };

    Ok(Router::new()
        .route("/health", get(gateway_health))
        .route("/", get(gateway_root))
        .fallback(proxy_request)
        .layer(middleware::from_fn(log_requests))
        .with_state(state))
}

/// Forward one request to the upstream selected by path prefix, returning
/// its status, headers and body unchanged.
async fn proxy_request(
    State(state): State<GatewayState>,
    client_addr: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> Response {
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);

    let Some(target) = state.config.target_for(&path) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Not found",
                "message": format!("No service registered for path '{path}'"),
            })),
        )
            .into_response();
    };

    let mut url = format!("{target}{path}");
    if let Some(query) = &query {
        url.push('?');
        url.push_str(query);
    }

    let method = request.method().clone();
    let mut headers = request.headers().clone();
    headers.remove(header::HOST);

    let forwarded_for = client_addr
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
        headers.insert("x-forwarded-for", value);
    }

    let body = match axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(err) => {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({
                    "error": "Payload too large",
                    "message": err.to_string(),
                })),
            )
                .into_response();
        }
    };

    info!("Proxying {} {} -> {}", method, path, url);

    let upstream = state
        .client
        .request(method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await;

    let upstream = match upstream {
        Ok(upstream) => upstream,
        Err(err) => {
            error!("Upstream request to {} failed: {}", url, err);
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": "Bad gateway",
                    "message": err.to_string(),
                })),
            )
                .into_response();
        }
    };

    let status = upstream.status();
    let mut response_headers = upstream.headers().clone();
    // The body is re-buffered here, so hop-by-hop framing headers no longer
    // apply.
    response_headers.remove(header::TRANSFER_ENCODING);
    response_headers.remove(header::CONNECTION);

    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("Failed to read upstream response from {}: {}", url, err);
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": "Bad gateway",
                    "message": err.to_string(),
                })),
            )
                .into_response();
        }
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    response
}

/// Probe every registered upstream's /health.
async fn gateway_health(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    let mut services = serde_json::Map::new();

    for (prefix, url) in state.config.routes() {
        let status = match state
            .client
            .get(format!("{url}/health"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => json!({
                "url": url,
                "status": "healthy",
            }),
            Ok(response) => json!({
                "url": url,
                "status": "unhealthy",
                "status_code": response.status().as_u16(),
            }),
            Err(err) => json!({
                "url": url,
                "status": "unreachable",
                "error": err.to_string(),
            }),
        };
        services.insert(prefix.clone(), status);
    }

    Json(json!({
        "gateway": "ok",
        "services": services,
    }))
}

async fn gateway_root(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    let prefixes: Vec<&str> = state
        .config
        .routes()
        .iter()
        .map(|(prefix, _)| prefix.as_str())
        .collect();

    Json(json!({
        "message": "Trainforge API gateway",
        "services": prefixes,
    }))
}

/// Log method, path, status and latency for every request.
async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );

    response
}
