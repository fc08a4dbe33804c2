//! Accept an uploaded CSV and start its conversion job

use crate::features::jobs::commands::create::CreateJobError;
use crate::features::jobs::orchestrator::{JobOrchestrator, PendingUpload};
use crate::storage::{Storage, StorageError};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Client-declared metadata of the multipart `file` field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileCommand {
    pub original_name: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileResponse {
    pub job_id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadFileError {
    #[error("No file uploaded")]
    FileRequired,
    #[error("Only CSV files are allowed")]
    NotCsv,
    #[error("File exceeds the maximum allowed size of {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("Storage error: {0}")]
    Storage(StorageError),
    #[error("Failed to create job: {0}")]
    Job(#[from] CreateJobError),
}

impl From<StorageError> for UploadFileError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TooLarge { limit } => Self::TooLarge { limit },
            other => Self::Storage(other),
        }
    }
}

impl crate::cqrs::middleware::Command for UploadFileCommand {}

fn has_csv_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn is_csv_mime(content_type: &str) -> bool {
    content_type
        .parse::<mime::Mime>()
        .map(|m| m.subtype().as_str().to_ascii_lowercase().contains("csv"))
        .unwrap_or(false)
}

impl UploadFileCommand {
    /// Both the file extension and the declared MIME type must say CSV
    pub fn validate(&self) -> Result<(), UploadFileError> {
        if self.original_name.trim().is_empty() {
            return Err(UploadFileError::FileRequired);
        }
        let mime_ok = self.content_type.as_deref().is_some_and(is_csv_mime);
        if !has_csv_extension(&self.original_name) || !mime_ok {
            return Err(UploadFileError::NotCsv);
        }
        Ok(())
    }
}

/// Validate, stream the body into the upload directory, then hand off to the
/// orchestrator. Returns as soon as the job row exists.
#[tracing::instrument(skip(storage, orchestrator, body), fields(original_name = %command.original_name))]
pub async fn handle<S, B, E>(
    storage: &Storage,
    orchestrator: &JobOrchestrator,
    command: UploadFileCommand,
    body: S,
) -> Result<UploadFileResponse, UploadFileError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    command.validate()?;

    let stored = storage.save_stream(body).await?;

    let pending = PendingUpload {
        original_name: command.original_name,
        filename: stored.filename,
        path: stored.path,
    };

    let job = match orchestrator.create_job(pending.clone()).await {
        Ok(job) => job,
        Err(e) => {
            if let Err(cleanup) = storage.delete_file(&pending.path).await {
                tracing::warn!(error = %cleanup, "Failed to remove upload after job creation failed");
            }
            return Err(e.into());
        },
    };

    tracing::info!(job_id = job.id, size = stored.size, "Upload accepted");

    Ok(UploadFileResponse { job_id: job.id })
}
