use std::sync::Arc;

use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use super::health::health_check;
use super::{action_types, levels, tags, trainings};
use crate::auth::{cors_layer, security_headers_layer, AuthService};
use crate::services::{
    ActionTypeService, LevelService, StorageService, TagService, TrainingService,
};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub training_service: TrainingService,
    pub tag_service: TagService,
    pub level_service: LevelService,
    pub action_type_service: ActionTypeService,
    pub storage_service: Option<Arc<StorageService>>,
}

/// Backend API router. Read endpoints are public; mutations sit behind the
/// JWT middleware.
pub fn create_routes(
    db: PgPool,
    jwt_secret: &str,
    storage_service: Option<Arc<StorageService>>,
) -> Router {
    let state = AppState {
        auth_service: AuthService::new(db.clone(), jwt_secret),
        training_service: TrainingService::new(db.clone()),
        tag_service: TagService::new(db.clone()),
        level_service: LevelService::new(db.clone()),
        action_type_service: ActionTypeService::new(db),
        storage_service,
    };

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/training", trainings::routes(state.clone()))
        .nest("/api/v1/tags", tags::routes(state.clone()))
        .nest("/api/v1/levels", levels::routes(state.clone()))
        .nest("/api/v1/actions", action_types::routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(security_headers_layer())
        .layer(cors_layer())
}
