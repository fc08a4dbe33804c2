use crate::models::Upload;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Delete one upload record, returning it so the caller can restore it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveUploadCommand {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum RemoveUploadError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Option<Upload>, RemoveUploadError>> for RemoveUploadCommand {}

impl crate::cqrs::middleware::Command for RemoveUploadCommand {}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: SqlitePool,
    command: RemoveUploadCommand,
) -> Result<Option<Upload>, RemoveUploadError> {
    let removed = sqlx::query_as::<_, Upload>(
        r#"
        DELETE FROM uploads
        WHERE id = ?
        RETURNING id, original_name, filename, file_hash, created_at, updated_at
        "#,
    )
    .bind(command.id)
    .fetch_optional(&pool)
    .await?;

    Ok(removed)
}
