use sqlx::PgPool;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{CreateLevel, Level, UpdateLevel};

#[derive(Clone)]
pub struct LevelService {
    db: PgPool,
}

impl LevelService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn create_level(&self, data: CreateLevel) -> Result<Level, ApiError> {
        data.validate()?;

        if self.get_by_label(&data.label).await?.is_some() {
            return Err(ApiError::Conflict(format!(
                "Level '{}' already exists",
                data.label
            )));
        }

        let level = sqlx::query_as::<_, Level>(
            "INSERT INTO levels (label) VALUES ($1) RETURNING value, label",
        )
        .bind(&data.label)
        .fetch_one(&self.db)
        .await?;

        Ok(level)
    }

    pub async fn get_level(&self, value: i32) -> Result<Option<Level>, ApiError> {
        let level = sqlx::query_as::<_, Level>("SELECT value, label FROM levels WHERE value = $1")
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(level)
    }

    pub async fn list_levels(&self, limit: i64, offset: i64) -> Result<Vec<Level>, ApiError> {
        let levels = sqlx::query_as::<_, Level>(
            "SELECT value, label FROM levels ORDER BY value LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(levels)
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn update_level(&self, value: i32, data: UpdateLevel) -> Result<Level, ApiError> {
        data.validate()?;

        let label = data
            .label
            .ok_or_else(|| ApiError::BadRequest("A new label is required".to_string()))?;

        if self.get_level(value).await?.is_none() {
            return Err(ApiError::NotFound(format!("Level {value} not found")));
        }
        if let Some(existing) = self.get_by_label(&label).await? {
            if existing.value != value {
                return Err(ApiError::Conflict(format!(
                    "Level '{label}' already exists"
                )));
            }
        }

        let level = sqlx::query_as::<_, Level>(
            "UPDATE levels SET label = $2 WHERE value = $1 RETURNING value, label",
        )
        .bind(value)
        .bind(&label)
        .fetch_one(&self.db)
        .await?;

        Ok(level)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_level(&self, value: i32) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM levels WHERE value = $1")
            .bind(value)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("Level {value} not found")));
        }
        Ok(())
    }

    async fn get_by_label(&self, label: &str) -> Result<Option<Level>, ApiError> {
        let level = sqlx::query_as::<_, Level>("SELECT value, label FROM levels WHERE label = $1")
            .bind(label)
            .fetch_optional(&self.db)
            .await?;
        Ok(level)
    }
}
