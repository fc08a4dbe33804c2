use chrono::{DateTime, Duration, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Bulk delete of jobs created strictly before `cutoff`
///
/// Only rows are removed; CSV and JSON files on disk are left in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepJobsCommand {
    pub cutoff: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepJobsResponse {
    pub deleted: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SweepJobsError {
    #[error("Retention period cannot be negative")]
    NegativeRetention,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<SweepJobsResponse, SweepJobsError>> for SweepJobsCommand {}

impl crate::cqrs::middleware::Command for SweepJobsCommand {}

impl SweepJobsCommand {
    /// Cutoff `days` before now
    pub fn older_than_days(days: i64) -> Result<Self, SweepJobsError> {
        if days < 0 {
            return Err(SweepJobsError::NegativeRetention);
        }
        Ok(Self {
            cutoff: Utc::now() - Duration::days(days),
        })
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: SqlitePool,
    command: SweepJobsCommand,
) -> Result<SweepJobsResponse, SweepJobsError> {
    let result = sqlx::query("DELETE FROM jobs WHERE created_at < ?")
        .bind(command.cutoff)
        .execute(&pool)
        .await?;

    Ok(SweepJobsResponse {
        deleted: result.rows_affected(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::insert_job_at;
    use crate::models::JobStatus;

    #[test]
    fn test_negative_days_rejected() {
        assert!(matches!(
            SweepJobsCommand::older_than_days(-1),
            Err(SweepJobsError::NegativeRetention)
        ));
    }

    #[sqlx::test]
    async fn test_deletes_only_strictly_older(pool: SqlitePool) -> sqlx::Result<()> {
        let cutoff = Utc::now() - Duration::days(3);

        let old = insert_job_at(&pool, JobStatus::Success, cutoff - Duration::seconds(1)).await?;
        let boundary = insert_job_at(&pool, JobStatus::Error, cutoff).await?;
        let fresh = insert_job_at(&pool, JobStatus::Pending, Utc::now()).await?;

        let response = handle(pool.clone(), SweepJobsCommand { cutoff }).await.unwrap();
        assert_eq!(response.deleted, 1);

        let remaining: Vec<(i64,)> = sqlx::query_as("SELECT id FROM jobs ORDER BY id")
            .fetch_all(&pool)
            .await?;
        let remaining: Vec<i64> = remaining.into_iter().map(|(id,)| id).collect();
        assert!(!remaining.contains(&old));
        assert_eq!(remaining, vec![boundary, fresh]);
        Ok(())
    }

    #[sqlx::test]
    async fn test_sweep_ignores_status(pool: SqlitePool) -> sqlx::Result<()> {
        let long_ago = Utc::now() - Duration::days(10);
        for status in [JobStatus::Pending, JobStatus::Loading, JobStatus::Success, JobStatus::Error] {
            insert_job_at(&pool, status, long_ago).await?;
        }

        let command = SweepJobsCommand::older_than_days(3).unwrap();
        let response = handle(pool.clone(), command).await.unwrap();
        assert_eq!(response.deleted, 4);
        Ok(())
    }

    #[sqlx::test]
    async fn test_empty_table(pool: SqlitePool) -> sqlx::Result<()> {
        let response = handle(pool.clone(), SweepJobsCommand::older_than_days(0).unwrap())
            .await
            .unwrap();
        assert_eq!(response.deleted, 0);
        Ok(())
    }
}
