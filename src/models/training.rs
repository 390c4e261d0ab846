use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateStep, Level, StepResponse, Tag, UpsertStep};

#[derive(Debug, Clone, FromRow)]
pub struct TrainingRow {
    pub uuid: Uuid,
    pub title: String,
    pub description: String,
    pub creator_id: Uuid,
    pub level_id: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub publish: bool,
    pub skip_steps: bool,
    pub created_at: DateTime<Utc>,
}

/// Full training document: level, tags, and all steps flat in
/// `step_number` order. Nested subtrees are served by the steps endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingResponse {
    pub uuid: Uuid,
    pub title: String,
    pub description: String,
    pub creator_id: Uuid,
    pub level_id: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub publish: bool,
    pub skip_steps: bool,
    pub created_at: DateTime<Utc>,
    pub level: Option<Level>,
    pub tags: Vec<Tag>,
    pub steps: Vec<StepResponse>,
}

impl TrainingResponse {
    pub fn from_parts(
        row: TrainingRow,
        level: Option<Level>,
        tags: Vec<Tag>,
        steps: Vec<StepResponse>,
    ) -> Self {
        Self {
            uuid: row.uuid,
            title: row.title,
            description: row.description,
            creator_id: row.creator_id,
            level_id: row.level_id,
            duration_minutes: row.duration_minutes,
            publish: row.publish,
            skip_steps: row.skip_steps,
            created_at: row.created_at,
            level,
            tags,
            steps,
        }
    }
}

/// Training without its steps, for listing endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub uuid: Uuid,
    pub title: String,
    pub description: String,
    pub creator_id: Uuid,
    pub level_id: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub publish: bool,
    pub skip_steps: bool,
    pub created_at: DateTime<Utc>,
    pub level: Option<Level>,
    pub tags: Vec<Tag>,
}

impl TrainingSummary {
    pub fn from_parts(row: TrainingRow, level: Option<Level>, tags: Vec<Tag>) -> Self {
        Self {
            uuid: row.uuid,
            title: row.title,
            description: row.description,
            creator_id: row.creator_id,
            level_id: row.level_id,
            duration_minutes: row.duration_minutes,
            publish: row.publish,
            skip_steps: row.skip_steps,
            created_at: row.created_at,
            level,
            tags,
        }
    }
}

fn default_skip_steps() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTraining {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    pub description: String,
    pub level_id: Option<i32>,
    #[validate(range(min = 0))]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub publish: bool,
    #[serde(default = "default_skip_steps")]
    pub skip_steps: bool,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
    #[serde(default)]
    pub steps: Vec<CreateStep>,
}

/// Partial update. `tag_ids` replaces the full tag set when present; `steps`
/// upserts (entries with an id update, entries without create).
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTraining {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub level_id: Option<i32>,
    #[validate(range(min = 0))]
    pub duration_minutes: Option<i32>,
    pub publish: Option<bool>,
    pub skip_steps: Option<bool>,
    pub tag_ids: Option<Vec<i32>>,
    pub steps: Option<Vec<UpsertStep>>,
}
