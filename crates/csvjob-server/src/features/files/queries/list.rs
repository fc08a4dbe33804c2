use crate::models::Upload;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// All uploads, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUploadsQuery;

#[derive(Debug, thiserror::Error)]
pub enum ListUploadsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<Upload>, ListUploadsError>> for ListUploadsQuery {}

impl crate::cqrs::middleware::Query for ListUploadsQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: SqlitePool, _query: ListUploadsQuery) -> Result<Vec<Upload>, ListUploadsError> {
    let uploads = sqlx::query_as::<_, Upload>(
        r#"
        SELECT id, original_name, filename, file_hash, created_at, updated_at
        FROM uploads
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(uploads)
}
