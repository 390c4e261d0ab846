use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::routes::AppState;
use super::steps;
use super::PaginationQuery;
use crate::auth::{jwt_auth_middleware, UserSession};
use crate::error::ApiError;
use crate::models::{
    CreateTraining, StepResponse, TrainingResponse, TrainingSummary, UpdateTraining,
};
use crate::services::StorageService;

pub fn routes(state: AppState) -> Router {
    let auth = middleware::from_fn_with_state(state.auth_service.clone(), jwt_auth_middleware);

    let public = Router::new()
        .route("/", get(list_trainings))
        .route("/:training_uuid", get(get_training))
        .route("/:training_uuid/steps", get(steps::get_step_tree));

    let protected = Router::new()
        .route("/", post(create_training))
        .route("/my_trainings", get(my_trainings))
        .route(
            "/:training_uuid",
            patch(patch_training).delete(delete_training),
        )
        .route("/:training_uuid/photos", post(upload_photos))
        .route(
            "/:training_uuid/steps",
            post(steps::add_step).delete(steps::delete_steps_bulk),
        )
        .route("/:training_uuid/steps/bulk", post(steps::add_steps_bulk))
        .route("/:training_uuid/steps/reorder", patch(steps::reorder_steps))
        .route(
            "/:training_uuid/steps/:step_id",
            patch(steps::update_step).delete(steps::delete_step),
        )
        .route_layer(auth);

    public.merge(protected).with_state(state)
}

async fn create_training(
    State(state): State<AppState>,
    session: UserSession,
    Json(payload): Json<CreateTraining>,
) -> Result<(StatusCode, Json<TrainingResponse>), ApiError> {
    let training = state
        .training_service
        .create_training(session.user_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(training)))
}

async fn get_training(
    State(state): State<AppState>,
    Path(training_uuid): Path<Uuid>,
) -> Result<Json<TrainingResponse>, ApiError> {
    let training = state
        .training_service
        .get_training(training_uuid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Training not found".to_string()))?;
    Ok(Json(training))
}

async fn list_trainings(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Vec<TrainingResponse>>, ApiError> {
    pagination
        .validate()
        .map_err(|msg| ApiError::BadRequest(msg.to_string()))?;

    let trainings = state
        .training_service
        .list_trainings(pagination.limit(), pagination.offset())
        .await?;
    Ok(Json(trainings))
}

/// Trainings owned by the authenticated user, without steps.
async fn my_trainings(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<Vec<TrainingSummary>>, ApiError> {
    let trainings = state
        .training_service
        .trainings_by_creator(session.user_id)
        .await?;
    Ok(Json(trainings))
}

async fn patch_training(
    State(state): State<AppState>,
    Path(training_uuid): Path<Uuid>,
    Json(payload): Json<UpdateTraining>,
) -> Result<Json<TrainingResponse>, ApiError> {
    let training = state
        .training_service
        .patch_training(training_uuid, payload)
        .await?;
    Ok(Json(training))
}

async fn delete_training(
    State(state): State<AppState>,
    Path(training_uuid): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.training_service.delete_training(training_uuid).await?;
    Ok(Json(json!({ "message": "Training deleted" })))
}

#[derive(Debug, Serialize)]
struct PhotoUploadResponse {
    uploaded_urls: Vec<String>,
    created_steps: Vec<StepResponse>,
}

/// Upload step images and append one step per image.
async fn upload_photos(
    State(state): State<AppState>,
    Path(training_uuid): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<PhotoUploadResponse>, ApiError> {
    let storage = state
        .storage_service
        .clone()
        .ok_or_else(|| ApiError::BadRequest("Object storage is not configured".to_string()))?;

    state.training_service.ensure_training(training_uuid).await?;

    let mut uploaded_urls = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(format!("Invalid multipart payload: {err}")))?
    {
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|err| ApiError::BadRequest(format!("Failed to read '{filename}': {err}")))?;

        let object_key = StorageService::generate_object_key(&filename);
        let url = storage
            .upload_image(data.to_vec(), &object_key, &content_type)
            .await?;
        uploaded_urls.push(url);
    }

    if uploaded_urls.is_empty() {
        return Err(ApiError::BadRequest("No files provided".to_string()));
    }

    let created_steps = state
        .training_service
        .steps_from_images(training_uuid, uploaded_urls.clone())
        .await?;

    Ok(Json(PhotoUploadResponse {
        uploaded_urls,
        created_steps,
    }))
}
