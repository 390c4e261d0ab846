use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};

use crate::auth::{
    extract_bearer_token, jwt_auth_middleware, AuthError, AuthResponse, AuthService, LoginRequest,
    MessageResponse, RefreshTokenRequest, RegisterRequest, TokenResponse, UserInfo, UserSession,
};

/// Routes served by the auth microservice. Only `/me` sits behind the JWT
/// middleware; the rest authenticate by payload.
pub fn auth_routes(auth_service: AuthService) -> Router {
    let require_session =
        middleware::from_fn_with_state(auth_service.clone(), jwt_auth_middleware);

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/me", get(me).route_layer(require_session))
        .with_state(auth_service)
}

#[tracing::instrument(skip(auth_service, request))]
async fn register(
    State(auth_service): State<AuthService>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let tokens = auth_service.register(request).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

#[tracing::instrument(skip(auth_service, request))]
async fn login(
    State(auth_service): State<AuthService>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    auth_service.login(request).await.map(Json)
}

#[tracing::instrument(skip(auth_service, request))]
async fn refresh_token(
    State(auth_service): State<AuthService>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    auth_service.refresh_token(request).await.map(Json)
}

/// Logout takes the token to revoke from the Authorization header itself.
#[tracing::instrument(skip(auth_service, request))]
async fn logout(
    State(auth_service): State<AuthService>,
    request: Request,
) -> Result<Json<MessageResponse>, AuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = extract_bearer_token(auth_header)?;
    auth_service.logout(token).await.map(Json)
}

#[tracing::instrument(skip(auth_service, session))]
async fn me(
    State(auth_service): State<AuthService>,
    session: UserSession,
) -> Result<Json<UserInfo>, AuthError> {
    auth_service.me(session.user_id).await.map(Json)
}
