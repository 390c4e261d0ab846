use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Level {
    pub value: i32,
    pub label: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLevel {
    #[validate(length(min = 1, max = 50))]
    pub label: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLevel {
    #[validate(length(min = 1, max = 50))]
    pub label: Option<String>,
}
