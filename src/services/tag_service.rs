use sqlx::PgPool;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{CreateTag, Tag, TagWithTrainingCount, UpdateTag};

#[derive(Clone)]
pub struct TagService {
    db: PgPool,
}

impl TagService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn create_tag(&self, data: CreateTag) -> Result<Tag, ApiError> {
        data.validate()?;

        if self.get_by_label(&data.label).await?.is_some() {
            return Err(ApiError::Conflict(format!(
                "Tag '{}' already exists",
                data.label
            )));
        }

        let tag = sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (label) VALUES ($1) RETURNING value, label",
        )
        .bind(&data.label)
        .fetch_one(&self.db)
        .await?;

        Ok(tag)
    }

    pub async fn get_tag(&self, value: i32) -> Result<Option<Tag>, ApiError> {
        let tag = sqlx::query_as::<_, Tag>("SELECT value, label FROM tags WHERE value = $1")
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(tag)
    }

    pub async fn list_tags(&self, limit: i64, offset: i64) -> Result<Vec<Tag>, ApiError> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT value, label FROM tags ORDER BY label LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(tags)
    }

    pub async fn tags_with_training_count(&self) -> Result<Vec<TagWithTrainingCount>, ApiError> {
        let tags = sqlx::query_as::<_, TagWithTrainingCount>(
            "SELECT t.value, t.label, COUNT(tt.training_uuid) AS trainings_count
             FROM tags t
             LEFT JOIN training_tags tt ON tt.tag_value = t.value
             GROUP BY t.value, t.label
             ORDER BY t.label",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(tags)
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn update_tag(&self, value: i32, data: UpdateTag) -> Result<Tag, ApiError> {
        data.validate()?;

        let label = data
            .label
            .ok_or_else(|| ApiError::BadRequest("A new label is required".to_string()))?;

        if self.get_tag(value).await?.is_none() {
            return Err(ApiError::NotFound(format!("Tag {value} not found")));
        }
        if let Some(existing) = self.get_by_label(&label).await? {
            if existing.value != value {
                return Err(ApiError::Conflict(format!("Tag '{label}' already exists")));
            }
        }

        let tag = sqlx::query_as::<_, Tag>(
            "UPDATE tags SET label = $2 WHERE value = $1 RETURNING value, label",
        )
        .bind(value)
        .bind(&label)
        .fetch_one(&self.db)
        .await?;

        Ok(tag)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_tag(&self, value: i32) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM tags WHERE value = $1")
            .bind(value)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("Tag {value} not found")));
        }
        Ok(())
    }

    pub async fn tag_exists(&self, value: i32) -> Result<bool, ApiError> {
        Ok(self.get_tag(value).await?.is_some())
    }

    async fn get_by_label(&self, label: &str) -> Result<Option<Tag>, ApiError> {
        let tag = sqlx::query_as::<_, Tag>("SELECT value, label FROM tags WHERE label = $1")
            .bind(label)
            .fetch_optional(&self.db)
            .await?;
        Ok(tag)
    }
}
