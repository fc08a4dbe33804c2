use crate::models::Upload;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Delete every upload record in one statement, returning what was removed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoveAllUploadsCommand;

#[derive(Debug, thiserror::Error)]
pub enum RemoveAllUploadsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<Upload>, RemoveAllUploadsError>> for RemoveAllUploadsCommand {}

impl crate::cqrs::middleware::Command for RemoveAllUploadsCommand {}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: SqlitePool,
    _command: RemoveAllUploadsCommand,
) -> Result<Vec<Upload>, RemoveAllUploadsError> {
    let removed = sqlx::query_as::<_, Upload>(
        r#"
        DELETE FROM uploads
        RETURNING id, original_name, filename, file_hash, created_at, updated_at
        "#,
    )
    .fetch_all(&pool)
    .await?;

    tracing::debug!(count = removed.len(), "Upload records removed");

    Ok(removed)
}
