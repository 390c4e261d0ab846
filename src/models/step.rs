use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::ActionType;

/// A step row as stored: adjacency list via `parent_step_id`.
#[derive(Debug, Clone, FromRow)]
pub struct StepRow {
    pub id: i64,
    pub training_uuid: Uuid,
    pub step_number: i32,
    pub action_type_id: Option<i32>,
    pub parent_step_id: Option<i64>,
    pub area: Option<Value>,
    pub meta: Option<Value>,
    pub annotation: Option<String>,
    pub image_url: Option<String>,
}

/// Flat step representation, used inside training documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResponse {
    pub id: i64,
    pub training_uuid: Uuid,
    pub step_number: i32,
    pub parent_step_id: Option<i64>,
    pub area: Option<Value>,
    pub meta: Option<Value>,
    pub annotation: Option<String>,
    pub image_url: Option<String>,
    pub action_type: Option<ActionType>,
}

impl StepResponse {
    pub fn from_row(row: StepRow, action_type: Option<ActionType>) -> Self {
        Self {
            id: row.id,
            training_uuid: row.training_uuid,
            step_number: row.step_number,
            parent_step_id: row.parent_step_id,
            area: row.area,
            meta: row.meta,
            annotation: row.annotation,
            image_url: row.image_url,
            action_type,
        }
    }
}

/// A step with its nested children, as returned by the step-tree endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepNode {
    pub id: i64,
    pub training_uuid: Uuid,
    pub step_number: i32,
    pub parent_step_id: Option<i64>,
    pub area: Option<Value>,
    pub meta: Option<Value>,
    pub annotation: Option<String>,
    pub image_url: Option<String>,
    pub action_type: Option<ActionType>,
    pub steps: Vec<StepNode>,
}

/// Payload for creating a step. `steps` carries nested children which are
/// inserted under the freshly created parent.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStep {
    pub step_number: i32,
    pub action_type_id: Option<i32>,
    pub parent_step_id: Option<i64>,
    pub area: Option<Value>,
    pub meta: Option<Value>,
    pub annotation: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub steps: Vec<CreateStep>,
}

/// Partial step update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStep {
    pub step_number: Option<i32>,
    pub action_type_id: Option<i32>,
    pub parent_step_id: Option<i64>,
    pub area: Option<Value>,
    pub meta: Option<Value>,
    pub annotation: Option<String>,
    pub image_url: Option<String>,
}

/// Step entry inside a training PATCH: with an id it updates, without it
/// creates.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertStep {
    pub id: Option<i64>,
    pub step_number: Option<i32>,
    pub action_type_id: Option<i32>,
    pub parent_step_id: Option<i64>,
    pub area: Option<Value>,
    pub meta: Option<Value>,
    pub annotation: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StepBulkCreateRequest {
    pub steps: Vec<CreateStep>,
}

#[derive(Debug, Deserialize)]
pub struct StepBulkDeleteRequest {
    pub step_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct StepBulkDeleteReport {
    pub deleted: usize,
    pub not_found: Vec<i64>,
    pub total_requested: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepOrder {
    pub id: i64,
    pub step_number: i32,
}

#[derive(Debug, Deserialize)]
pub struct StepsReorderRequest {
    pub steps: Vec<StepOrder>,
}

#[derive(Debug, Serialize)]
pub struct StepsReorderReport {
    pub updated: usize,
    pub total_requested: usize,
}
