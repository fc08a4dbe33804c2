use crate::models::{Job, JobStatus};
use chrono::Utc;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Partial update of a job
///
/// Status changes must follow [`JobStatus::can_transition_to`]. The write
/// is conditional on the status read beforehand, so a concurrent change surfaces
/// as [`UpdateJobError::Conflict`] instead of being overwritten.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateJobCommand {
    pub id: i64,
    pub status: Option<JobStatus>,
    pub error: Option<String>,
    pub file_path: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateJobError {
    #[error("At least one of status, error or file_path must be set")]
    NothingToUpdate,
    #[error("File path cannot be empty")]
    FilePathEmpty,
    #[error("Job {0} not found")]
    NotFound(i64),
    #[error("Job cannot move from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
    #[error("Job {0} was modified concurrently")]
    Conflict(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Job, UpdateJobError>> for UpdateJobCommand {}

impl crate::cqrs::middleware::Command for UpdateJobCommand {}

impl UpdateJobCommand {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn validate(&self) -> Result<(), UpdateJobError> {
        if self.status.is_none() && self.error.is_none() && self.file_path.is_none() {
            return Err(UpdateJobError::NothingToUpdate);
        }
        if self.file_path.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(UpdateJobError::FilePathEmpty);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool), fields(job_id = command.id))]
pub async fn handle(pool: SqlitePool, command: UpdateJobCommand) -> Result<Job, UpdateJobError> {
    command.validate()?;

    let (current,): (JobStatus,) = sqlx::query_as("SELECT status FROM jobs WHERE id = ?")
        .bind(command.id)
        .fetch_optional(&pool)
        .await?
        .ok_or(UpdateJobError::NotFound(command.id))?;

    if let Some(next) = command.status {
        let unchanged = next == current && !current.is_terminal();
        if !unchanged && !current.can_transition_to(next) {
            return Err(UpdateJobError::InvalidTransition {
                from: current,
                to: next,
            });
        }
    }

    let job = sqlx::query_as::<_, Job>(
        r#"
        UPDATE jobs
        SET status = COALESCE(?, status),
            error = COALESCE(?, error),
            file_path = COALESCE(?, file_path),
            updated_at = ?
        WHERE id = ? AND status = ?
        RETURNING id, status, file_path, error, created_at, updated_at
        "#,
    )
    .bind(command.status)
    .bind(&command.error)
    .bind(&command.file_path)
    .bind(Utc::now())
    .bind(command.id)
    .bind(current)
    .fetch_optional(&pool)
    .await?
    .ok_or(UpdateJobError::Conflict(command.id))?;

    tracing::debug!(from = %current, to = %job.status, "Job updated");

    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::jobs::commands::create::{self, CreateJobCommand};

    async fn new_job(pool: &SqlitePool) -> Job {
        create::handle(pool.clone(), CreateJobCommand::new("uploads/x.csv"))
            .await
            .unwrap()
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            UpdateJobCommand::new(1).validate(),
            Err(UpdateJobError::NothingToUpdate)
        ));
        assert!(matches!(
            UpdateJobCommand::new(1).file_path("").validate(),
            Err(UpdateJobError::FilePathEmpty)
        ));
        assert!(UpdateJobCommand::new(1).status(JobStatus::Loading).validate().is_ok());
    }

    #[sqlx::test]
    async fn test_happy_path_to_success(pool: SqlitePool) -> sqlx::Result<()> {
        let job = new_job(&pool).await;

        let loading = handle(pool.clone(), UpdateJobCommand::new(job.id).status(JobStatus::Loading))
            .await
            .unwrap();
        assert_eq!(loading.status, JobStatus::Loading);

        let done = handle(
            pool.clone(),
            UpdateJobCommand::new(job.id)
                .status(JobStatus::Success)
                .file_path("uploads/original.csv"),
        )
        .await
        .unwrap();

        assert_eq!(done.status, JobStatus::Success);
        assert_eq!(done.file_path, "uploads/original.csv");
        assert!(done.error.is_none());
        assert!(done.updated_at >= job.updated_at);
        Ok(())
    }

    #[sqlx::test]
    async fn test_error_records_message(pool: SqlitePool) -> sqlx::Result<()> {
        let job = new_job(&pool).await;
        handle(pool.clone(), UpdateJobCommand::new(job.id).status(JobStatus::Loading))
            .await
            .unwrap();

        let failed = handle(
            pool.clone(),
            UpdateJobCommand::new(job.id)
                .status(JobStatus::Error)
                .error("hash calculation failed"),
        )
        .await
        .unwrap();

        assert_eq!(failed.status, JobStatus::Error);
        assert_eq!(failed.error.as_deref(), Some("hash calculation failed"));
        assert_eq!(failed.file_path, "uploads/x.csv");
        Ok(())
    }

    #[sqlx::test]
    async fn test_terminal_status_is_stable(pool: SqlitePool) -> sqlx::Result<()> {
        let job = new_job(&pool).await;
        for status in [JobStatus::Loading, JobStatus::Success] {
            handle(pool.clone(), UpdateJobCommand::new(job.id).status(status))
                .await
                .unwrap();
        }

        for status in [JobStatus::Error, JobStatus::Loading, JobStatus::Success] {
            let result = handle(pool.clone(), UpdateJobCommand::new(job.id).status(status)).await;
            assert!(matches!(
                result,
                Err(UpdateJobError::InvalidTransition {
                    from: JobStatus::Success,
                    ..
                })
            ));
        }
        Ok(())
    }

    #[sqlx::test]
    async fn test_cannot_skip_loading(pool: SqlitePool) -> sqlx::Result<()> {
        let job = new_job(&pool).await;
        let result = handle(pool.clone(), UpdateJobCommand::new(job.id).status(JobStatus::Success)).await;
        assert!(matches!(result, Err(UpdateJobError::InvalidTransition { .. })));
        Ok(())
    }

    #[sqlx::test]
    async fn test_not_found(pool: SqlitePool) -> sqlx::Result<()> {
        let result = handle(pool.clone(), UpdateJobCommand::new(999).status(JobStatus::Loading)).await;
        assert!(matches!(result, Err(UpdateJobError::NotFound(999))));
        Ok(())
    }
}
