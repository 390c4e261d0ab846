use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use validator::Validate;

/// Lookup classification for a step (click, input, scroll, ...).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActionType {
    pub id: i32,
    pub kind: String,
    pub name: Option<String>,
    pub meta: Option<Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateActionType {
    #[validate(length(min = 1, max = 50))]
    pub kind: String,
    #[validate(length(max = 100))]
    pub name: Option<String>,
    pub meta: Option<Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateActionType {
    #[validate(length(min = 1, max = 50))]
    pub kind: Option<String>,
    #[validate(length(max = 100))]
    pub name: Option<String>,
    pub meta: Option<Value>,
}
