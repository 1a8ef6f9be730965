/// Image model and database operations
///
/// Each user owns an ordered gallery. Positions are dense per user, so the
/// reindexing scope is `Scope::UserImages(user_id)`. Image bytes live in
/// object storage; this table only records the public URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::ModelResult;
use crate::ordering::{
    append_in, remove_and_compact_in, PgPositionStore, PositionStore, PositionTx, PositionUpdate,
    ReorderOutcome, Reindexer, Scope,
};

const IMAGE_COLUMNS: &str = "id, user_id, url, position, created_at";

/// Gallery image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Image {
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Public URL of the stored object
    pub url: String,

    /// 1-based place in the owner's gallery
    pub position: i32,

    pub created_at: DateTime<Utc>,
}

/// Input for registering an image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateImage {
    pub user_id: Uuid,
    pub url: String,
}

impl Image {
    /// Appends an image to the end of its owner's gallery
    pub async fn create(pool: &PgPool, data: CreateImage) -> ModelResult<Self> {
        let scope = Scope::UserImages(data.user_id);
        let mut tx = PgPositionStore::new(pool.clone()).begin().await?;

        let position = append_in(&mut tx, &scope).await?;

        let image = sqlx::query_as::<_, Image>(&format!(
            "INSERT INTO images (user_id, url, position)
             VALUES ($1, $2, $3)
             RETURNING {}",
            IMAGE_COLUMNS
        ))
        .bind(data.user_id)
        .bind(data.url)
        .bind(position)
        .fetch_one(tx.conn())
        .await?;

        tx.commit().await?;

        info!(image_id = %image.id, user_id = %image.user_id, position, "Created image");
        Ok(image)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> ModelResult<Option<Self>> {
        let image = sqlx::query_as::<_, Image>(&format!(
            "SELECT {} FROM images WHERE id = $1",
            IMAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(image)
    }

    /// Gallery of one user, ascending by position
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> ModelResult<Vec<Self>> {
        let images = sqlx::query_as::<_, Image>(&format!(
            "SELECT {} FROM images WHERE user_id = $1 ORDER BY position ASC",
            IMAGE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(images)
    }

    /// Galleries of several users, grouped by user and ascending by position
    pub async fn list_for_users(pool: &PgPool, user_ids: &[Uuid]) -> ModelResult<Vec<Self>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let images = sqlx::query_as::<_, Image>(&format!(
            "SELECT {} FROM images WHERE user_id = ANY($1) ORDER BY user_id, position ASC",
            IMAGE_COLUMNS
        ))
        .bind(user_ids)
        .fetch_all(pool)
        .await?;

        Ok(images)
    }

    /// Deletes an image and closes the gap in its owner's gallery
    ///
    /// Returns false if the image did not exist.
    pub async fn delete(pool: &PgPool, id: Uuid) -> ModelResult<bool> {
        let mut tx = PgPositionStore::new(pool.clone()).begin().await?;

        let removed: Option<(Uuid, i32)> =
            sqlx::query_as("DELETE FROM images WHERE id = $1 RETURNING user_id, position")
                .bind(id)
                .fetch_optional(tx.conn())
                .await?;

        let Some((user_id, position)) = removed else {
            tx.rollback().await?;
            return Ok(false);
        };

        remove_and_compact_in(&mut tx, &Scope::UserImages(user_id), position).await?;
        tx.commit().await?;

        info!(image_id = %id, user_id = %user_id, position, "Deleted image");
        Ok(true)
    }

    /// Applies a drag-and-drop batch to one user's gallery
    pub async fn update_positions(
        pool: &PgPool,
        user_id: Uuid,
        updates: &[PositionUpdate],
    ) -> ModelResult<ReorderOutcome> {
        let reindexer = Reindexer::new(PgPositionStore::new(pool.clone()));
        Ok(reindexer
            .reorder(&Scope::UserImages(user_id), updates)
            .await?)
    }
}
