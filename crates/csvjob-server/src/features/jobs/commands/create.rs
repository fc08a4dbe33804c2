use crate::models::{Job, JobStatus};
use chrono::Utc;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Register a new job in `Pending` for an uploaded CSV
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobCommand {
    pub file_path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateJobError {
    #[error("File path is required and cannot be empty")]
    FilePathRequired,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Job, CreateJobError>> for CreateJobCommand {}

impl crate::cqrs::middleware::Command for CreateJobCommand {}

impl CreateJobCommand {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn validate(&self) -> Result<(), CreateJobError> {
        if self.file_path.trim().is_empty() {
            return Err(CreateJobError::FilePathRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: SqlitePool, command: CreateJobCommand) -> Result<Job, CreateJobError> {
    command.validate()?;

    let now = Utc::now();
    let job = sqlx::query_as::<_, Job>(
        r#"
        INSERT INTO jobs (status, file_path, error, created_at, updated_at)
        VALUES (?, ?, NULL, ?, ?)
        RETURNING id, status, file_path, error, created_at, updated_at
        "#,
    )
    .bind(JobStatus::Pending)
    .bind(&command.file_path)
    .bind(now)
    .bind(now)
    .fetch_one(&pool)
    .await?;

    tracing::debug!(job_id = job.id, "Job created");

    Ok(job)
}
