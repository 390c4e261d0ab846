use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};

use super::routes::AppState;
use super::PaginationQuery;
use crate::auth::jwt_auth_middleware;
use crate::error::ApiError;
use crate::models::{CreateLevel, Level, UpdateLevel};

pub fn routes(state: AppState) -> Router {
    let auth = middleware::from_fn_with_state(state.auth_service.clone(), jwt_auth_middleware);

    let public = Router::new()
        .route("/", get(list_levels))
        .route("/:level_value", get(get_level));

    let protected = Router::new()
        .route("/", post(create_level))
        .route("/:level_value", patch(update_level).delete(delete_level))
        .route_layer(auth);

    public.merge(protected).with_state(state)
}

async fn create_level(
    State(state): State<AppState>,
    Json(payload): Json<CreateLevel>,
) -> Result<(StatusCode, Json<Level>), ApiError> {
    let level = state.level_service.create_level(payload).await?;
    Ok((StatusCode::CREATED, Json(level)))
}

async fn list_levels(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Vec<Level>>, ApiError> {
    pagination
        .validate()
        .map_err(|msg| ApiError::BadRequest(msg.to_string()))?;

    let levels = state
        .level_service
        .list_levels(pagination.limit(), pagination.offset())
        .await?;
    Ok(Json(levels))
}

async fn get_level(
    State(state): State<AppState>,
    Path(level_value): Path<i32>,
) -> Result<Json<Level>, ApiError> {
    let level = state
        .level_service
        .get_level(level_value)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Level {level_value} not found")))?;
    Ok(Json(level))
}

async fn update_level(
    State(state): State<AppState>,
    Path(level_value): Path<i32>,
    Json(payload): Json<UpdateLevel>,
) -> Result<Json<Level>, ApiError> {
    let level = state.level_service.update_level(level_value, payload).await?;
    Ok(Json(level))
}

async fn delete_level(
    State(state): State<AppState>,
    Path(level_value): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    state.level_service.delete_level(level_value).await?;
    Ok(Json(json!({ "message": "Level deleted" })))
}
