use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub value: i32,
    pub label: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTag {
    #[validate(length(min = 1, max = 50))]
    pub label: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTag {
    #[validate(length(min = 1, max = 50))]
    pub label: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct TagWithTrainingCount {
    pub value: i32,
    pub label: String,
    pub trainings_count: i64,
}
