use crate::models::Upload;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Dedup lookup by content hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindUploadByHashQuery {
    pub file_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FindUploadByHashError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Option<Upload>, FindUploadByHashError>> for FindUploadByHashQuery {}

impl crate::cqrs::middleware::Query for FindUploadByHashQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: SqlitePool,
    query: FindUploadByHashQuery,
) -> Result<Option<Upload>, FindUploadByHashError> {
    let upload = sqlx::query_as::<_, Upload>(
        r#"
        SELECT id, original_name, filename, file_hash, created_at, updated_at
        FROM uploads
        WHERE file_hash = ?
        "#,
    )
    .bind(&query.file_hash)
    .fetch_optional(&pool)
    .await?;

    Ok(upload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::insert_upload;

    #[sqlx::test]
    async fn test_finds_by_hash(pool: SqlitePool) -> sqlx::Result<()> {
        let upload = insert_upload(&pool, "a.csv", &"e".repeat(64)).await?;

        let found = handle(pool.clone(), FindUploadByHashQuery { file_hash: "e".repeat(64) })
            .await
            .unwrap();
        assert_eq!(found, Some(upload));

        let missing = handle(pool.clone(), FindUploadByHashQuery { file_hash: "f".repeat(64) })
            .await
            .unwrap();
        assert!(missing.is_none());
        Ok(())
    }
}
