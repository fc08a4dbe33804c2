use crate::features::jobs::queries::get_job::{self, GetJobError, GetJobQuery};
use crate::models::JobStatus;
use csvjob_common::transcode::artifact_path;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::PathBuf;

/// Locate the JSON artifact of a finished job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadFileQuery {
    pub job_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadFileResponse {
    pub path: PathBuf,
    /// Attachment name, the artifact's base name
    pub filename: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadFileError {
    #[error("Job not found")]
    JobNotFound,
    #[error("Job not completed successfully")]
    NotReady(JobStatus),
    #[error("Processed file not found")]
    ArtifactMissing,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<GetJobError> for DownloadFileError {
    fn from(err: GetJobError) -> Self {
        match err {
            GetJobError::NotFound => Self::JobNotFound,
            GetJobError::Database(e) => Self::Database(e),
        }
    }
}

impl Request<Result<DownloadFileResponse, DownloadFileError>> for DownloadFileQuery {}

impl crate::cqrs::middleware::Query for DownloadFileQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: SqlitePool,
    query: DownloadFileQuery,
) -> Result<DownloadFileResponse, DownloadFileError> {
    let job = get_job::handle(pool, GetJobQuery { id: query.job_id }).await?;

    if job.status != JobStatus::Success {
        return Err(DownloadFileError::NotReady(job.status));
    }

    let path = artifact_path(&job.file_path);
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {},
        _ => {
            tracing::warn!(job_id = job.id, path = %path.display(), "Artifact missing for successful job");
            return Err(DownloadFileError::ArtifactMissing);
        },
    }

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download.json".to_string());

    Ok(DownloadFileResponse { path, filename })
}
