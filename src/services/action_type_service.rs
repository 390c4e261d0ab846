use sqlx::PgPool;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{ActionType, CreateActionType, UpdateActionType};

#[derive(Clone)]
pub struct ActionTypeService {
    db: PgPool,
}

impl ActionTypeService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn create_action_type(
        &self,
        data: CreateActionType,
    ) -> Result<ActionType, ApiError> {
        data.validate()?;

        let action_type = sqlx::query_as::<_, ActionType>(
            "INSERT INTO action_types (kind, name, meta) VALUES ($1, $2, $3)
             RETURNING id, kind, name, meta",
        )
        .bind(&data.kind)
        .bind(&data.name)
        .bind(&data.meta)
        .fetch_one(&self.db)
        .await?;

        Ok(action_type)
    }

    pub async fn get_action_type(&self, id: i32) -> Result<Option<ActionType>, ApiError> {
        let action_type = sqlx::query_as::<_, ActionType>(
            "SELECT id, kind, name, meta FROM action_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(action_type)
    }

    pub async fn list_action_types(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ActionType>, ApiError> {
        let action_types = sqlx::query_as::<_, ActionType>(
            "SELECT id, kind, name, meta FROM action_types ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(action_types)
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn update_action_type(
        &self,
        id: i32,
        data: UpdateActionType,
    ) -> Result<ActionType, ApiError> {
        data.validate()?;

        let action_type = sqlx::query_as::<_, ActionType>(
            "UPDATE action_types
             SET kind = COALESCE($2, kind),
                 name = COALESCE($3, name),
                 meta = COALESCE($4, meta)
             WHERE id = $1
             RETURNING id, kind, name, meta",
        )
        .bind(id)
        .bind(&data.kind)
        .bind(&data.name)
        .bind(&data.meta)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Action type {id} not found")))?;

        Ok(action_type)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_action_type(&self, id: i32) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM action_types WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("Action type {id} not found")));
        }
        Ok(())
    }
}
