use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use super::routes::AppState;
use super::PaginationQuery;
use crate::auth::jwt_auth_middleware;
use crate::error::ApiError;
use crate::models::{CreateTag, Tag, TagWithTrainingCount, TrainingSummary, UpdateTag};

pub fn routes(state: AppState) -> Router {
    let auth = middleware::from_fn_with_state(state.auth_service.clone(), jwt_auth_middleware);

    let public = Router::new()
        .route("/", get(list_tags))
        .route("/with-count", get(tags_with_count))
        .route("/:tag_value", get(get_tag))
        .route("/:tag_value/trainings", get(trainings_by_tag));

    let protected = Router::new()
        .route("/", post(create_tag))
        .route("/:tag_value", axum::routing::patch(update_tag).delete(delete_tag))
        .route_layer(auth);

    public.merge(protected).with_state(state)
}

async fn create_tag(
    State(state): State<AppState>,
    Json(payload): Json<CreateTag>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let tag = state.tag_service.create_tag(payload).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn list_tags(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    pagination
        .validate()
        .map_err(|msg| ApiError::BadRequest(msg.to_string()))?;

    let tags = state
        .tag_service
        .list_tags(pagination.limit(), pagination.offset())
        .await?;
    Ok(Json(tags))
}

async fn tags_with_count(
    State(state): State<AppState>,
) -> Result<Json<Vec<TagWithTrainingCount>>, ApiError> {
    let tags = state.tag_service.tags_with_training_count().await?;
    Ok(Json(tags))
}

async fn get_tag(
    State(state): State<AppState>,
    Path(tag_value): Path<i32>,
) -> Result<Json<Tag>, ApiError> {
    let tag = state
        .tag_service
        .get_tag(tag_value)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Tag {tag_value} not found")))?;
    Ok(Json(tag))
}

async fn trainings_by_tag(
    State(state): State<AppState>,
    Path(tag_value): Path<i32>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Vec<TrainingSummary>>, ApiError> {
    pagination
        .validate()
        .map_err(|msg| ApiError::BadRequest(msg.to_string()))?;

    if !state.tag_service.tag_exists(tag_value).await? {
        return Err(ApiError::NotFound(format!("Tag {tag_value} not found")));
    }

    let trainings = state
        .training_service
        .trainings_by_tag(tag_value, pagination.limit(), pagination.offset())
        .await?;
    Ok(Json(trainings))
}

async fn update_tag(
    State(state): State<AppState>,
    Path(tag_value): Path<i32>,
    Json(payload): Json<UpdateTag>,
) -> Result<Json<Tag>, ApiError> {
    let tag = state.tag_service.update_tag(tag_value, payload).await?;
    Ok(Json(tag))
}

async fn delete_tag(
    State(state): State<AppState>,
    Path(tag_value): Path<i32>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state.tag_service.delete_tag(tag_value).await?;
    Ok((StatusCode::OK, Json(json!({ "message": "Tag deleted" }))))
}
