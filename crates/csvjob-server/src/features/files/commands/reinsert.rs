use crate::features::shared::error_helpers::map_unique_violation;
use crate::models::Upload;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Put a removed upload back exactly as it was, id and timestamps included
///
/// Only used to roll back a delete whose disk cleanup failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReinsertUploadCommand {
    pub upload: Upload,
}

#[derive(Debug, thiserror::Error)]
pub enum ReinsertUploadError {
    #[error("Upload {0} or its hash already exists")]
    Conflict(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Upload, ReinsertUploadError>> for ReinsertUploadCommand {}

impl crate::cqrs::middleware::Command for ReinsertUploadCommand {}

#[tracing::instrument(skip(pool), fields(upload_id = command.upload.id))]
pub async fn handle(
    pool: SqlitePool,
    command: ReinsertUploadCommand,
) -> Result<Upload, ReinsertUploadError> {
    let upload = command.upload;

    sqlx::query(
        r#"
        INSERT INTO uploads (id, original_name, filename, file_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(upload.id)
    .bind(&upload.original_name)
    .bind(&upload.filename)
    .bind(&upload.file_hash)
    .bind(upload.created_at)
    .bind(upload.updated_at)
    .execute(&pool)
    .await
    .map_err(|e| {
        map_unique_violation(e, ReinsertUploadError::Conflict(upload.id), ReinsertUploadError::Database)
    })?;

    Ok(upload)
}
