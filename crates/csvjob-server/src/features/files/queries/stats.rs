use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadStatsQuery;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadStats {
    pub total: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadStatsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<UploadStats, UploadStatsError>> for UploadStatsQuery {}

impl crate::cqrs::middleware::Query for UploadStatsQuery {}

pub async fn handle(pool: SqlitePool, _query: UploadStatsQuery) -> Result<UploadStats, UploadStatsError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM uploads")
        .fetch_one(&pool)
        .await?;

    Ok(UploadStats { total })
}
