//! Get job query

use crate::models::Job;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetJobQuery {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GetJobError {
    #[error("Job not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Job, GetJobError>> for GetJobQuery {}

impl crate::cqrs::middleware::Query for GetJobQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: SqlitePool, query: GetJobQuery) -> Result<Job, GetJobError> {
    let job = sqlx::query_as::<_, Job>(
        r#"
        SELECT id, status, file_path, error, created_at, updated_at
        FROM jobs
        WHERE id = ?
        "#,
    )
    .bind(query.id)
    .fetch_optional(&pool)
    .await?
    .ok_or(GetJobError::NotFound)?;

    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::jobs::commands::create::{self, CreateJobCommand};
    use crate::models::JobStatus;

    #[sqlx::test]
    async fn test_get_existing(pool: SqlitePool) -> sqlx::Result<()> {
        let created = create::handle(pool.clone(), CreateJobCommand::new("uploads/a.csv"))
            .await
            .unwrap();

        let job = handle(pool.clone(), GetJobQuery { id: created.id }).await.unwrap();
        assert_eq!(job, created);
        assert_eq!(job.status, JobStatus::Pending);
        Ok(())
    }

    #[sqlx::test]
    async fn test_get_missing(pool: SqlitePool) -> sqlx::Result<()> {
        let result = handle(pool.clone(), GetJobQuery { id: 12345 }).await;
        assert!(matches!(result, Err(GetJobError::NotFound)));
        Ok(())
    }
}
