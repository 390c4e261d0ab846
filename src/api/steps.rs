use axum::{
    extract::{Path, State},
    response::Json,
    http::StatusCode,
};
use uuid::Uuid;

use super::routes::AppState;
use crate::error::ApiError;
use crate::models::{
    CreateStep, StepBulkCreateRequest, StepBulkDeleteReport, StepBulkDeleteRequest, StepNode,
    StepResponse, StepsReorderReport, StepsReorderRequest, UpdateStep,
};

/// Full nested step tree of a training.
pub async fn get_step_tree(
    State(state): State<AppState>,
    Path(training_uuid): Path<Uuid>,
) -> Result<Json<Vec<StepNode>>, ApiError> {
    let tree = state.training_service.get_step_tree(training_uuid).await?;
    Ok(Json(tree))
}

pub async fn add_step(
    State(state): State<AppState>,
    Path(training_uuid): Path<Uuid>,
    Json(payload): Json<CreateStep>,
) -> Result<(StatusCode, Json<StepResponse>), ApiError> {
    let step = state.training_service.add_step(training_uuid, payload).await?;
    Ok((StatusCode::CREATED, Json(step)))
}

pub async fn add_steps_bulk(
    State(state): State<AppState>,
    Path(training_uuid): Path<Uuid>,
    Json(payload): Json<StepBulkCreateRequest>,
) -> Result<(StatusCode, Json<Vec<StepResponse>>), ApiError> {
    let steps = state
        .training_service
        .add_steps_bulk(training_uuid, payload.steps)
        .await?;
    Ok((StatusCode::CREATED, Json(steps)))
}

pub async fn update_step(
    State(state): State<AppState>,
    Path((training_uuid, step_id)): Path<(Uuid, i64)>,
    Json(payload): Json<UpdateStep>,
) -> Result<Json<StepResponse>, ApiError> {
    let step = state
        .training_service
        .update_step(training_uuid, step_id, payload)
        .await?;
    Ok(Json(step))
}

pub async fn delete_step(
    State(state): State<AppState>,
    Path((training_uuid, step_id)): Path<(Uuid, i64)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .training_service
        .delete_step(training_uuid, step_id)
        .await?;
    Ok(Json(serde_json::json!({
        "message": format!("Step {step_id} deleted")
    })))
}

pub async fn delete_steps_bulk(
    State(state): State<AppState>,
    Path(training_uuid): Path<Uuid>,
    Json(payload): Json<StepBulkDeleteRequest>,
) -> Result<Json<StepBulkDeleteReport>, ApiError> {
    let report = state
        .training_service
        .delete_steps_bulk(training_uuid, payload.step_ids)
        .await?;
    Ok(Json(report))
}

/// Bulk renumbering: every id must belong to the training or the batch is
/// rejected whole.
pub async fn reorder_steps(
    State(state): State<AppState>,
    Path(training_uuid): Path<Uuid>,
    Json(payload): Json<StepsReorderRequest>,
) -> Result<Json<StepsReorderReport>, ApiError> {
    let report = state
        .training_service
        .reorder_steps(training_uuid, payload.steps)
        .await?;
    Ok(Json(report))
}
