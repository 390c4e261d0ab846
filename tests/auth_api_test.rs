use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use trainforge::api::auth::auth_routes;
use trainforge::auth::AuthService;

mod common;
use common::{clean_database, test_pool, TEST_JWT_SECRET};

fn app(pool: sqlx::PgPool) -> Router {
    Router::new().nest(
        "/api/v1/auth",
        auth_routes(AuthService::new(pool, TEST_JWT_SECRET)),
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_register_login_and_me() {
    let Some(pool) = test_pool().await else { return };
    clean_database(&pool).await;
    let app = app(pool);

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({
                "email": "newuser@example.com",
                "password": "SecurePassword123",
                "full_name": "New User"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["user"]["email"], "newuser@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password_hash").is_none());

    // Duplicate registration conflicts.
    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({ "email": "newuser@example.com", "password": "SecurePassword123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": "newuser@example.com", "password": "SecurePassword123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get_with_token("/api/v1/auth/me", &access_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "newuser@example.com");
    assert_eq!(body["full_name"], "New User");
}

#[tokio::test]
async fn test_register_validation() {
    let Some(pool) = test_pool().await else { return };
    clean_database(&pool).await;
    let app = app(pool);

    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({ "email": "not-an-email", "password": "SecurePassword123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({ "email": "short@example.com", "password": "abc" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let Some(pool) = test_pool().await else { return };
    clean_database(&pool).await;
    let app = app(pool);

    send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({ "email": "victim@example.com", "password": "SecurePassword123" }),
        ),
    )
    .await;

    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": "victim@example.com", "password": "WrongPassword" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Unknown emails get the same answer as bad passwords.
    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": "nobody@example.com", "password": "SecurePassword123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_and_logout() {
    let Some(pool) = test_pool().await else { return };
    clean_database(&pool).await;
    let app = app(pool);

    let (_, body) = send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({ "email": "cycle@example.com", "password": "SecurePassword123" }),
        ),
    )
    .await;
    let access_token = body["access_token"].as_str().unwrap().to_string();
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        post_json("/api/v1/auth/refresh", json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    // An access token is not a stored refresh token.
    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/auth/refresh",
            json!({ "refresh_token": access_token }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logout blacklists the access token.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/logout")
        .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get_with_token("/api/v1/auth/me", &access_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
