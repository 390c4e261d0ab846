use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, header as header_matcher, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trainforge::gateway::{create_gateway, GatewayConfig};

fn gateway(routes: Vec<(String, String)>) -> Router {
    let config = GatewayConfig::new("127.0.0.1".to_string(), 8000, routes);
    create_gateway(config).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test]
async fn test_requests_route_by_longest_prefix() {
    let auth_upstream = MockServer::start().await;
    let backend_upstream = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "service": "auth" })))
        .mount(&auth_upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/training"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "service": "backend" })))
        .mount(&backend_upstream)
        .await;

    let app = gateway(vec![
        ("/api/v1/auth".to_string(), auth_upstream.uri()),
        ("/api/v1".to_string(), backend_upstream.uri()),
    ]);

    let (status, body) = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/auth/login")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "auth");

    let (status, body) = send(
        &app,
        Request::builder()
            .method(Method::GET)
            .uri("/api/v1/training")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "backend");
}

#[tokio::test]
async fn test_body_headers_and_query_are_forwarded() {
    let upstream = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/training"))
        .and(query_param("limit", "5"))
        .and(header_matcher("authorization", "Bearer token-123"))
        .and(body_json(json!({ "title": "Proxied" })))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("x-upstream", "1")
                .set_body_json(json!({ "created": true })),
        )
        .mount(&upstream)
        .await;

    let app = gateway(vec![("/api/v1".to_string(), upstream.uri())]);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/training?limit=5")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer token-123")
        .body(Body::from(json!({ "title": "Proxied" }).to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    // Upstream status and headers come back unchanged.
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers().get("x-upstream").unwrap().to_str().unwrap(),
        "1"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["created"], json!(true));
}

#[tokio::test]
async fn test_upstream_errors_pass_through() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/training/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Not found" })))
        .mount(&upstream)
        .await;

    let app = gateway(vec![("/api/v1".to_string(), upstream.uri())]);

    let (status, body) = send(
        &app,
        Request::builder()
            .method(Method::GET)
            .uri("/api/v1/training/missing")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_unknown_prefix_is_404() {
    let app = gateway(vec![(
        "/api/v1".to_string(),
        "http://localhost:8002".to_string(),
    )]);

    let (status, body) = send(
        &app,
        Request::builder()
            .method(Method::GET)
            .uri("/metrics")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_unreachable_upstream_is_502() {
    // Nothing listens on this port.
    let app = gateway(vec![(
        "/api/v1".to_string(),
        "http://127.0.0.1:59999".to_string(),
    )]);

    let (status, body) = send(
        &app,
        Request::builder()
            .method(Method::GET)
            .uri("/api/v1/training")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Bad gateway");
}

#[tokio::test]
async fn test_health_aggregates_upstreams() {
    let healthy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&healthy)
        .await;

    let app = gateway(vec![
        ("/api/v1/auth".to_string(), healthy.uri()),
        ("/api/v1".to_string(), "http://127.0.0.1:59999".to_string()),
    ]);

    let (status, body) = send(
        &app,
        Request::builder()
            .method(Method::GET)
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gateway"], "ok");
    assert_eq!(body["services"]["/api/v1/auth"]["status"], "healthy");
    assert_eq!(body["services"]["/api/v1"]["status"], "unreachable");
}
