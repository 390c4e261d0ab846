use std::collections::HashMap;

use futures::future::BoxFuture;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{
    ActionType, CreateStep, CreateTraining, Level, StepBulkDeleteReport, StepNode, StepOrder,
    StepResponse, StepRow, StepsReorderReport, Tag, TrainingResponse, TrainingRow,
    TrainingSummary, UpdateStep, UpdateTraining, UpsertStep,
};
use crate::services::step_tree::build_step_tree;

/// Persistence and retrieval for training documents and their step trees.
///
/// Steps live in an adjacency-list table; every mutation that touches a step
/// first proves the step belongs to the addressed training.
#[derive(Clone)]
pub struct TrainingService {
    db: PgPool,
}

impl TrainingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a training together with its tags and (possibly nested) steps
    /// in one transaction.
    #[tracing::instrument(skip(self, data))]
    pub async fn create_training(
        &self,
        creator_id: Uuid,
        data: CreateTraining,
    ) -> Result<TrainingResponse, ApiError> {
        data.validate()?;

        let mut tx = self.db.begin().await?;

        let row: TrainingRow = sqlx::query_as(
            "INSERT INTO trainings (title, description, creator_id, level_id, duration_minutes, publish, skip_steps)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING uuid, title, description, creator_id, level_id, duration_minutes, publish, skip_steps, created_at",
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(creator_id)
        .bind(data.level_id)
        .bind(data.duration_minutes)
        .bind(data.publish)
        .bind(data.skip_steps)
        .fetch_one(&mut *tx)
        .await?;

        if !data.tag_ids.is_empty() {
            attach_tags(&mut tx, row.uuid, &data.tag_ids).await?;
        }

        for step in &data.steps {
            ensure_action_type_exists(&mut tx, step).await?;
            if let Some(parent_id) = step.parent_step_id {
                // Only steps inserted earlier in this payload qualify.
                ensure_step_in_training(&mut tx, row.uuid, parent_id).await?;
            }
            insert_step_subtree(&mut tx, row.uuid, step, step.parent_step_id).await?;
        }

        tx.commit().await?;

        self.get_training(row.uuid)
            .await?
            .ok_or_else(|| ApiError::NotFound("Training disappeared after creation".to_string()))
    }

    pub async fn get_training(&self, uuid: Uuid) -> Result<Option<TrainingResponse>, ApiError> {
        let row: Option<TrainingRow> = sqlx::query_as(
            "SELECT uuid, title, description, creator_id, level_id, duration_minutes, publish, skip_steps, created_at
             FROM trainings WHERE uuid = $1",
        )
        .bind(uuid)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let level = self.load_level(row.level_id).await?;
        let tags = self.load_tags(row.uuid).await?;
        let steps = self.load_steps(row.uuid).await?;

        Ok(Some(TrainingResponse::from_parts(row, level, tags, steps)))
    }

    pub async fn list_trainings(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TrainingResponse>, ApiError> {
        let rows: Vec<TrainingRow> = sqlx::query_as(
            "SELECT uuid, title, description, creator_id, level_id, duration_minutes, publish, skip_steps, created_at
             FROM trainings ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let mut trainings = Vec::with_capacity(rows.len());
        for row in rows {
            let level = self.load_level(row.level_id).await?;
            let tags = self.load_tags(row.uuid).await?;
            let steps = self.load_steps(row.uuid).await?;
            trainings.push(TrainingResponse::from_parts(row, level, tags, steps));
        }

        Ok(trainings)
    }

    /// Trainings owned by a user, without their steps.
    pub async fn trainings_by_creator(
        &self,
        creator_id: Uuid,
    ) -> Result<Vec<TrainingSummary>, ApiError> {
        let rows: Vec<TrainingRow> = sqlx::query_as(
            "SELECT uuid, title, description, creator_id, level_id, duration_minutes, publish, skip_steps, created_at
             FROM trainings WHERE creator_id = $1 ORDER BY created_at DESC",
        )
        .bind(creator_id)
        .fetch_all(&self.db)
        .await?;

        self.summarize(rows).await
    }

    pub async fn trainings_by_tag(
        &self,
        tag_value: i32,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TrainingSummary>, ApiError> {
        let rows: Vec<TrainingRow> = sqlx::query_as(
            "SELECT t.uuid, t.title, t.description, t.creator_id, t.level_id, t.duration_minutes, t.publish, t.skip_steps, t.created_at
             FROM trainings t
             JOIN training_tags tt ON tt.training_uuid = t.uuid
             WHERE tt.tag_value = $1
             ORDER BY t.created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(tag_value)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        self.summarize(rows).await
    }

    /// Partial update of scalar fields, the tag set, and steps (upsert) in
    /// one transaction.
    #[tracing::instrument(skip(self, data))]
    pub async fn patch_training(
        &self,
        uuid: Uuid,
        data: UpdateTraining,
    ) -> Result<TrainingResponse, ApiError> {
        data.validate()?;

        let mut tx = self.db.begin().await?;

        if !training_exists(&mut tx, uuid).await? {
            return Err(ApiError::NotFound("Training not found".to_string()));
        }

        let touches_scalars = data.title.is_some()
            || data.description.is_some()
            || data.level_id.is_some()
            || data.duration_minutes.is_some()
            || data.publish.is_some()
            || data.skip_steps.is_some();

        if touches_scalars {
            sqlx::query(
                "UPDATE trainings
                 SET title = COALESCE($2, title),
                     description = COALESCE($3, description),
                     level_id = COALESCE($4, level_id),
                     duration_minutes = COALESCE($5, duration_minutes),
                     publish = COALESCE($6, publish),
                     skip_steps = COALESCE($7, skip_steps)
                 WHERE uuid = $1",
            )
            .bind(uuid)
            .bind(&data.title)
            .bind(&data.description)
            .bind(data.level_id)
            .bind(data.duration_minutes)
            .bind(data.publish)
            .bind(data.skip_steps)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(tag_ids) = &data.tag_ids {
            sqlx::query("DELETE FROM training_tags WHERE training_uuid = $1")
                .bind(uuid)
                .execute(&mut *tx)
                .await?;
            attach_tags(&mut tx, uuid, tag_ids).await?;
        }

        if let Some(steps) = &data.steps {
            upsert_steps(&mut tx, uuid, steps).await?;
        }

        tx.commit().await?;

        self.get_training(uuid)
            .await?
            .ok_or_else(|| ApiError::NotFound("Training not found".to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_training(&self, uuid: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM trainings WHERE uuid = $1")
            .bind(uuid)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Training not found".to_string()));
        }
        Ok(())
    }

    /// The training's full step tree: one query, assembled in memory.
    pub async fn get_step_tree(&self, uuid: Uuid) -> Result<Vec<StepNode>, ApiError> {
        self.ensure_training(uuid).await?;

        let rows: Vec<StepRow> = sqlx::query_as(
            "SELECT id, training_uuid, step_number, action_type_id, parent_step_id, area, meta, annotation, image_url
             FROM training_steps WHERE training_uuid = $1 ORDER BY step_number, id",
        )
        .bind(uuid)
        .fetch_all(&self.db)
        .await?;

        let action_types = self.load_action_types(&rows).await?;
        Ok(build_step_tree(rows, &action_types))
    }

    /// Add one step (optionally with a nested subtree under it).
    #[tracing::instrument(skip(self, step))]
    pub async fn add_step(
        &self,
        uuid: Uuid,
        step: CreateStep,
    ) -> Result<StepResponse, ApiError> {
        let mut tx = self.db.begin().await?;

        if !training_exists(&mut tx, uuid).await? {
            return Err(ApiError::NotFound("Training not found".to_string()));
        }
        ensure_action_type_exists(&mut tx, &step).await?;
        if let Some(parent_id) = step.parent_step_id {
            ensure_step_in_training(&mut tx, uuid, parent_id).await?;
        }

        let step_id = insert_step_subtree(&mut tx, uuid, &step, step.parent_step_id).await?;
        tx.commit().await?;

        self.get_step(uuid, step_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Step disappeared after creation".to_string()))
    }

    #[tracing::instrument(skip(self, steps))]
    pub async fn add_steps_bulk(
        &self,
        uuid: Uuid,
        steps: Vec<CreateStep>,
    ) -> Result<Vec<StepResponse>, ApiError> {
        let mut tx = self.db.begin().await?;

        if !training_exists(&mut tx, uuid).await? {
            return Err(ApiError::NotFound("Training not found".to_string()));
        }

        let mut created_ids = Vec::with_capacity(steps.len());
        for step in &steps {
            ensure_action_type_exists(&mut tx, step).await?;
            if let Some(parent_id) = step.parent_step_id {
                ensure_step_in_training(&mut tx, uuid, parent_id).await?;
            }
            created_ids.push(insert_step_subtree(&mut tx, uuid, step, step.parent_step_id).await?);
        }

        tx.commit().await?;

        let mut created = Vec::with_capacity(created_ids.len());
        for id in created_ids {
            if let Some(step) = self.get_step(uuid, id).await? {
                created.push(step);
            }
        }
        Ok(created)
    }

    /// Partial update of a single step, addressed by training and step id.
    #[tracing::instrument(skip(self, data))]
    pub async fn update_step(
        &self,
        uuid: Uuid,
        step_id: i64,
        data: UpdateStep,
    ) -> Result<StepResponse, ApiError> {
        let mut tx = self.db.begin().await?;

        ensure_step_in_training(&mut tx, uuid, step_id).await?;

        if let Some(parent_id) = data.parent_step_id {
            if parent_id == step_id {
                return Err(ApiError::BadRequest(
                    "A step cannot be its own parent".to_string(),
                ));
            }
            ensure_step_in_training(&mut tx, uuid, parent_id).await?;
        }
        if let Some(action_type_id) = data.action_type_id {
            if !action_type_exists(&mut tx, action_type_id).await? {
                return Err(ApiError::NotFound(format!(
                    "Action type {action_type_id} not found"
                )));
            }
        }

        sqlx::query(
            "UPDATE training_steps
             SET step_number = COALESCE($3, step_number),
                 action_type_id = COALESCE($4, action_type_id),
                 parent_step_id = COALESCE($5, parent_step_id),
                 area = COALESCE($6, area),
                 meta = COALESCE($7, meta),
                 annotation = COALESCE($8, annotation),
                 image_url = COALESCE($9, image_url)
             WHERE id = $1 AND training_uuid = $2",
        )
        .bind(step_id)
        .bind(uuid)
        .bind(data.step_number)
        .bind(data.action_type_id)
        .bind(data.parent_step_id)
        .bind(&data.area)
        .bind(&data.meta)
        .bind(&data.annotation)
        .bind(&data.image_url)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_step(uuid, step_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Step {step_id} not found")))
    }

    /// Delete a step; its subtree goes with it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_step(&self, uuid: Uuid, step_id: i64) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM training_steps WHERE id = $1 AND training_uuid = $2")
            .bind(step_id)
            .bind(uuid)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!(
                "Step {step_id} not found in training {uuid}"
            )));
        }
        Ok(())
    }

    /// Delete several steps; ids that do not belong to the training are
    /// reported back instead of failing the batch.
    #[tracing::instrument(skip(self, step_ids))]
    pub async fn delete_steps_bulk(
        &self,
        uuid: Uuid,
        step_ids: Vec<i64>,
    ) -> Result<StepBulkDeleteReport, ApiError> {
        let total_requested = step_ids.len();
        let mut deleted = 0;
        let mut not_found = Vec::new();

        let mut tx = self.db.begin().await?;
        for step_id in step_ids {
            let result =
                sqlx::query("DELETE FROM training_steps WHERE id = $1 AND training_uuid = $2")
                    .bind(step_id)
                    .bind(uuid)
                    .execute(&mut *tx)
                    .await?;
            if result.rows_affected() > 0 {
                deleted += 1;
            } else {
                not_found.push(step_id);
            }
        }
        tx.commit().await?;

        Ok(StepBulkDeleteReport {
            deleted,
            not_found,
            total_requested,
        })
    }

    /// Renumber steps in bulk. The whole batch is rejected unless every id
    /// belongs to the training; step numbers themselves are caller-supplied
    /// and not checked for uniqueness or gaps.
    #[tracing::instrument(skip(self, orders))]
    pub async fn reorder_steps(
        &self,
        uuid: Uuid,
        orders: Vec<StepOrder>,
    ) -> Result<StepsReorderReport, ApiError> {
        self.ensure_training(uuid).await?;

        if orders.is_empty() {
            return Ok(StepsReorderReport {
                updated: 0,
                total_requested: 0,
            });
        }

        let ids: Vec<i64> = orders.iter().map(|order| order.id).collect();

        let mut tx = self.db.begin().await?;

        let owned: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM training_steps WHERE training_uuid = $1 AND id = ANY($2)",
        )
        .bind(uuid)
        .bind(&ids)
        .fetch_one(&mut *tx)
        .await?;

        if owned != ids.len() as i64 {
            return Err(ApiError::BadRequest(
                "One or more step ids do not belong to this training".to_string(),
            ));
        }

        for order in &orders {
            sqlx::query("UPDATE training_steps SET step_number = $1 WHERE id = $2")
                .bind(order.step_number)
                .bind(order.id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(StepsReorderReport {
            updated: orders.len(),
            total_requested: orders.len(),
        })
    }

    /// Append one untitled step per uploaded image, numbered after the
    /// current root steps.
    #[tracing::instrument(skip(self, image_urls))]
    pub async fn steps_from_images(
        &self,
        uuid: Uuid,
        image_urls: Vec<String>,
    ) -> Result<Vec<StepResponse>, ApiError> {
        let mut tx = self.db.begin().await?;

        if !training_exists(&mut tx, uuid).await? {
            return Err(ApiError::NotFound("Training not found".to_string()));
        }

        let root_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM training_steps WHERE training_uuid = $1 AND parent_step_id IS NULL",
        )
        .bind(uuid)
        .fetch_one(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(image_urls.len());
        for (i, url) in image_urls.iter().enumerate() {
            let step_number = root_count as i32 + 1 + i as i32;
            let row: StepRow = sqlx::query_as(
                "INSERT INTO training_steps (training_uuid, step_number, meta, image_url)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id, training_uuid, step_number, action_type_id, parent_step_id, area, meta, annotation, image_url",
            )
            .bind(uuid)
            .bind(step_number)
            .bind(serde_json::json!({ "name": "Untitled step" }))
            .bind(url)
            .fetch_one(&mut *tx)
            .await?;
            created.push(StepResponse::from_row(row, None));
        }
        tx.commit().await?;

        Ok(created)
    }

    pub async fn ensure_training(&self, uuid: Uuid) -> Result<(), ApiError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM trainings WHERE uuid = $1)")
            .bind(uuid)
            .fetch_one(&self.db)
            .await?;
        if !exists {
            return Err(ApiError::NotFound("Training not found".to_string()));
        }
        Ok(())
    }

    async fn get_step(&self, uuid: Uuid, step_id: i64) -> Result<Option<StepResponse>, ApiError> {
        let row: Option<StepRow> = sqlx::query_as(
            "SELECT id, training_uuid, step_number, action_type_id, parent_step_id, area, meta, annotation, image_url
             FROM training_steps WHERE id = $1 AND training_uuid = $2",
        )
        .bind(step_id)
        .bind(uuid)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let action_type = match row.action_type_id {
            Some(id) => {
                sqlx::query_as::<_, ActionType>(
                    "SELECT id, kind, name, meta FROM action_types WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&self.db)
                .await?
            }
            None => None,
        };

        Ok(Some(StepResponse::from_row(row, action_type)))
    }

    async fn load_level(&self, level_id: Option<i32>) -> Result<Option<Level>, ApiError> {
        let Some(level_id) = level_id else {
            return Ok(None);
        };
        let level = sqlx::query_as::<_, Level>("SELECT value, label FROM levels WHERE value = $1")
            .bind(level_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(level)
    }

    async fn load_tags(&self, uuid: Uuid) -> Result<Vec<Tag>, ApiError> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT t.value, t.label FROM tags t
             JOIN training_tags tt ON tt.tag_value = t.value
             WHERE tt.training_uuid = $1 ORDER BY t.label",
        )
        .bind(uuid)
        .fetch_all(&self.db)
        .await?;
        Ok(tags)
    }

    async fn load_steps(&self, uuid: Uuid) -> Result<Vec<StepResponse>, ApiError> {
        let rows: Vec<StepRow> = sqlx::query_as(
            "SELECT id, training_uuid, step_number, action_type_id, parent_step_id, area, meta, annotation, image_url
             FROM training_steps WHERE training_uuid = $1 ORDER BY step_number, id",
        )
        .bind(uuid)
        .fetch_all(&self.db)
        .await?;

        let action_types = self.load_action_types(&rows).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let action_type = row
                    .action_type_id
                    .and_then(|id| action_types.get(&id).cloned());
                StepResponse::from_row(row, action_type)
            })
            .collect())
    }

    async fn load_action_types(
        &self,
        rows: &[StepRow],
    ) -> Result<HashMap<i32, ActionType>, ApiError> {
        let mut ids: Vec<i32> = rows.iter().filter_map(|row| row.action_type_id).collect();
        ids.sort_unstable();
        ids.dedup();

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let action_types = sqlx::query_as::<_, ActionType>(
            "SELECT id, kind, name, meta FROM action_types WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        Ok(action_types
            .into_iter()
            .map(|action_type| (action_type.id, action_type))
            .collect())
    }

    async fn summarize(&self, rows: Vec<TrainingRow>) -> Result<Vec<TrainingSummary>, ApiError> {
        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let level = self.load_level(row.level_id).await?;
            let tags = self.load_tags(row.uuid).await?;
            summaries.push(TrainingSummary::from_parts(row, level, tags));
        }
        Ok(summaries)
    }
}

async fn training_exists(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    uuid: Uuid,
) -> Result<bool, ApiError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM trainings WHERE uuid = $1)")
        .bind(uuid)
        .fetch_one(&mut **tx)
        .await?;
    Ok(exists)
}

async fn action_type_exists(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    action_type_id: i32,
) -> Result<bool, ApiError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM action_types WHERE id = $1)")
            .bind(action_type_id)
            .fetch_one(&mut **tx)
            .await?;
    Ok(exists)
}

async fn ensure_step_in_training(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    uuid: Uuid,
    step_id: i64,
) -> Result<(), ApiError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM training_steps WHERE id = $1 AND training_uuid = $2)",
    )
    .bind(step_id)
    .bind(uuid)
    .fetch_one(&mut **tx)
    .await?;

    if !exists {
        return Err(ApiError::NotFound(format!(
            "Step {step_id} not found in training {uuid}"
        )));
    }
    Ok(())
}

/// Reject a step payload whose action type does not exist. Checks the whole
/// nested subtree, so a deep child with a bad reference fails up front.
async fn ensure_action_type_exists(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    step: &CreateStep,
) -> Result<(), ApiError> {
    let mut pending = vec![step];
    while let Some(current) = pending.pop() {
        if let Some(action_type_id) = current.action_type_id {
            if !action_type_exists(tx, action_type_id).await? {
                return Err(ApiError::NotFound(format!(
                    "Action type {action_type_id} not found"
                )));
            }
        }
        pending.extend(current.steps.iter());
    }
    Ok(())
}

async fn attach_tags(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    uuid: Uuid,
    tag_ids: &[i32],
) -> Result<(), ApiError> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    // Only existing tags attach; unknown ids are ignored.
    sqlx::query(
        "INSERT INTO training_tags (training_uuid, tag_value)
         SELECT $1, value FROM tags WHERE value = ANY($2)
         ON CONFLICT DO NOTHING",
    )
    .bind(uuid)
    .bind(tag_ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Insert a step and, depth-first, every nested child under it. Children
/// reference the freshly inserted parent's id.
fn insert_step_subtree<'a>(
    tx: &'a mut sqlx::Transaction<'_, sqlx::Postgres>,
    training_uuid: Uuid,
    step: &'a CreateStep,
    parent_step_id: Option<i64>,
) -> BoxFuture<'a, Result<i64, ApiError>> {
    Box::pin(async move {
        let step_id: i64 = sqlx::query_scalar(
            "INSERT INTO training_steps (training_uuid, step_number, action_type_id, parent_step_id, area, meta, annotation, image_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(training_uuid)
        .bind(step.step_number)
        .bind(step.action_type_id)
        .bind(parent_step_id)
        .bind(&step.area)
        .bind(&step.meta)
        .bind(&step.annotation)
        .bind(&step.image_url)
        .fetch_one(&mut **tx)
        .await?;

        for child in &step.steps {
            insert_step_subtree(tx, training_uuid, child, Some(step_id)).await?;
        }

        Ok(step_id)
    })
}

/// Apply a mixed batch of step updates and creations. Entries with an id
/// update the matching step (ids from other trainings are skipped); entries
/// without an id create a new step and need a step_number.
async fn upsert_steps(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    uuid: Uuid,
    steps: &[UpsertStep],
) -> Result<(), ApiError> {
    for entry in steps {
        if let Some(parent_id) = entry.parent_step_id {
            if entry.id == Some(parent_id) {
                return Err(ApiError::BadRequest(
                    "A step cannot be its own parent".to_string(),
                ));
            }
            ensure_step_in_training(tx, uuid, parent_id).await?;
        }
        match entry.id {
            Some(step_id) => {
                sqlx::query(
                    "UPDATE training_steps
                     SET step_number = COALESCE($3, step_number),
                         action_type_id = COALESCE($4, action_type_id),
                         parent_step_id = COALESCE($5, parent_step_id),
                         area = COALESCE($6, area),
                         meta = COALESCE($7, meta),
                         annotation = COALESCE($8, annotation),
                         image_url = COALESCE($9, image_url)
                     WHERE id = $1 AND training_uuid = $2",
                )
                .bind(step_id)
                .bind(uuid)
                .bind(entry.step_number)
                .bind(entry.action_type_id)
                .bind(entry.parent_step_id)
                .bind(&entry.area)
                .bind(&entry.meta)
                .bind(&entry.annotation)
                .bind(&entry.image_url)
                .execute(&mut **tx)
                .await?;
            }
            None => {
                let step_number = entry.step_number.ok_or_else(|| {
                    ApiError::BadRequest("step_number is required for new steps".to_string())
                })?;
                sqlx::query(
                    "INSERT INTO training_steps (training_uuid, step_number, action_type_id, parent_step_id, area, meta, annotation, image_url)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                )
                .bind(uuid)
                .bind(step_number)
                .bind(entry.action_type_id)
                .bind(entry.parent_step_id)
                .bind(&entry.area)
                .bind(&entry.meta)
                .bind(&entry.annotation)
                .bind(&entry.image_url)
                .execute(&mut **tx)
                .await?;
            }
        }
    }
    Ok(())
}
