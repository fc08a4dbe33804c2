use crate::features::shared::error_helpers::map_unique_violation;
use crate::models::Upload;
use chrono::Utc;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Register a converted upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUploadCommand {
    pub original_name: String,
    pub filename: String,
    pub file_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateUploadError {
    #[error("Original name is required and cannot be empty")]
    OriginalNameRequired,
    #[error("Filename is required and cannot be empty")]
    FilenameRequired,
    #[error("File hash must be a 64 character hex SHA-256 digest")]
    InvalidHash,
    #[error("An upload with hash '{0}' already exists")]
    Duplicate(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Upload, CreateUploadError>> for CreateUploadCommand {}

impl crate::cqrs::middleware::Command for CreateUploadCommand {}

impl CreateUploadCommand {
    pub fn validate(&self) -> Result<(), CreateUploadError> {
        if self.original_name.trim().is_empty() {
            return Err(CreateUploadError::OriginalNameRequired);
        }
        if self.filename.trim().is_empty() {
            return Err(CreateUploadError::FilenameRequired);
        }
        if self.file_hash.len() != 64 || !self.file_hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CreateUploadError::InvalidHash);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: SqlitePool,
    command: CreateUploadCommand,
) -> Result<Upload, CreateUploadError> {
    command.validate()?;

    let now = Utc::now();
    let upload = sqlx::query_as::<_, Upload>(
        r#"
        INSERT INTO uploads (original_name, filename, file_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, original_name, filename, file_hash, created_at, updated_at
        "#,
    )
    .bind(&command.original_name)
    .bind(&command.filename)
    .bind(&command.file_hash)
    .bind(now)
    .bind(now)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        map_unique_violation(
            e,
            CreateUploadError::Duplicate(command.file_hash.clone()),
            CreateUploadError::Database,
        )
    })?;

    Ok(upload)
}
