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
use crate::models::{ActionType, CreateActionType, UpdateActionType};

pub fn routes(state: AppState) -> Router {
    let auth = middleware::from_fn_with_state(state.auth_service.clone(), jwt_auth_middleware);

    let public = Router::new()
        .route("/", get(list_action_types))
        .route("/:action_type_id", get(get_action_type));

    let protected = Router::new()
        .route("/", post(create_action_type))
        .route(
            "/:action_type_id",
            patch(update_action_type).delete(delete_action_type),
        )
        .route_layer(auth);

    public.merge(protected).with_state(state)
}

async fn create_action_type(
    State(state): State<AppState>,
    Json(payload): Json<CreateActionType>,
) -> Result<(StatusCode, Json<ActionType>), ApiError> {
    let action_type = state.action_type_service.create_action_type(payload).await?;
    Ok((StatusCode::CREATED, Json(action_type)))
}

async fn list_action_types(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Vec<ActionType>>, ApiError> {
    pagination
        .validate()
        .map_err(|msg| ApiError::BadRequest(msg.to_string()))?;

    let action_types = state
        .action_type_service
        .list_action_types(pagination.limit(), pagination.offset())
        .await?;
    Ok(Json(action_types))
}

async fn get_action_type(
    State(state): State<AppState>,
    Path(action_type_id): Path<i32>,
) -> Result<Json<ActionType>, ApiError> {
    let action_type = state
        .action_type_service
        .get_action_type(action_type_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Action type {action_type_id} not found")))?;
    Ok(Json(action_type))
}

async fn update_action_type(
    State(state): State<AppState>,
    Path(action_type_id): Path<i32>,
    Json(payload): Json<UpdateActionType>,
) -> Result<Json<ActionType>, ApiError> {
    let action_type = state
        .action_type_service
        .update_action_type(action_type_id, payload)
        .await?;
    Ok(Json(action_type))
}

async fn delete_action_type(
    State(state): State<AppState>,
    Path(action_type_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    state
        .action_type_service
        .delete_action_type(action_type_id)
        .await?;
    Ok(Json(json!({ "message": "Action type deleted" })))
}
