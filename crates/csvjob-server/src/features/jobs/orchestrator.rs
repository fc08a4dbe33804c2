//! Job orchestrator
//!
//! Accepts a stored upload, creates its job and returns immediately. The
//! conversion pipeline then runs on a background task:
//!
//! 1. mark the job `Loading`
//! 2. hash the CSV
//! 3. look the hash up; a match finishes as a duplicate of the existing upload
//! 4. transcode to JSON
//! 5. register the upload
//!
//! Whatever happens the job ends in `Success` or `Error`. Failures are recorded on
//! the job and never returned to the HTTP caller. Pipeline tasks are tracked so
//! shutdown can wait for them.

use crate::features::files::commands::create::{self as create_upload, CreateUploadCommand, CreateUploadError};
use crate::features::files::queries::find_by_hash::{self, FindUploadByHashError, FindUploadByHashQuery};
use crate::features::jobs::commands::{
    create::{self as create_job, CreateJobCommand, CreateJobError},
    update::{self as update_job, UpdateJobCommand, UpdateJobError},
};
use crate::models::{Job, JobStatus, Upload};
use crate::storage::Storage;
use csvjob_common::{checksum, transcode, CsvJobError};
use futures::FutureExt;
use sqlx::SqlitePool;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn, Instrument};

/// A CSV sitting in the upload directory, waiting for conversion
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub original_name: String,
    /// Generated storage name
    pub filename: String,
    pub path: PathBuf,
}

/// How a successful pipeline finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Same content was already converted; the fresh files were discarded
    Duplicate(Upload),
    /// New content, converted and registered
    Created(Upload),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("could not start job: {0}")]
    Start(#[source] UpdateJobError),
    #[error("hash calculation failed: {0}")]
    Hash(#[source] CsvJobError),
    #[error("duplicate lookup failed: {0}")]
    Lookup(#[from] FindUploadByHashError),
    #[error("{0}")]
    Transcode(#[source] CsvJobError),
    #[error("failed to register upload: {0}")]
    Register(#[source] CreateUploadError),
    #[error("unexpected failure: {0}")]
    Panicked(String),
}

#[derive(Clone)]
pub struct JobOrchestrator {
    db: SqlitePool,
    storage: Storage,
    tasks: TaskTracker,
}

impl JobOrchestrator {
    pub fn new(db: SqlitePool, storage: Storage) -> Self {
        Self {
            db,
            storage,
            tasks: TaskTracker::new(),
        }
    }

    /// Create a `Pending` job for `upload` and start its pipeline in the background
    #[tracing::instrument(skip(self), fields(filename = %upload.filename))]
    pub async fn create_job(&self, upload: PendingUpload) -> Result<Job, CreateJobError> {
        let job = create_job::handle(
            self.db.clone(),
            CreateJobCommand::new(upload.path.to_string_lossy()),
        )
        .await?;

        let orchestrator = self.clone();
        let job_id = job.id;
        self.tasks.spawn(
            async move {
                let _ = orchestrator.run_job(job_id, upload).await;
            }
            .instrument(tracing::info_span!("run_job", job_id)),
        );

        Ok(job)
    }

    /// Wait up to `timeout` for running pipelines to finish
    ///
    /// Returns `false` when pipelines were still running at the deadline.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tasks.close();
        let pending = self.tasks.len();
        if pending > 0 {
            info!(pending, "Waiting for running jobs");
        }

        match tokio::time::timeout(timeout, self.tasks.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(pending = self.tasks.len(), "Jobs still running at shutdown deadline");
                false
            },
        }
    }

    /// Run the pipeline for an existing job to completion
    ///
    /// The final state is written to the job before this returns.
    pub async fn run_job(
        &self,
        job_id: i64,
        upload: PendingUpload,
    ) -> Result<PipelineOutcome, PipelineError> {
        let result = AssertUnwindSafe(self.execute(job_id, &upload))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(PipelineError::Panicked(panic_message(&*panic))));

        self.finalize(job_id, &upload, &result).await;
        result
    }

    async fn execute(
        &self,
        job_id: i64,
        upload: &PendingUpload,
    ) -> Result<PipelineOutcome, PipelineError> {
        self.mark_loading(job_id).await?;

        let hash = self.hash_stage(upload).await?;

        if let Some(existing) = self.dedup_stage(&hash).await? {
            return Ok(PipelineOutcome::Duplicate(existing));
        }

        let summary = self.transcode_stage(upload).await?;
        debug!(rows = summary.rows, "Transcode finished");

        self.register_stage(upload, hash).await
    }

    async fn mark_loading(&self, job_id: i64) -> Result<Job, PipelineError> {
        update_job::handle(
            self.db.clone(),
            UpdateJobCommand::new(job_id).status(JobStatus::Loading),
        )
        .await
        .map_err(PipelineError::Start)
    }

    async fn hash_stage(&self, upload: &PendingUpload) -> Result<String, PipelineError> {
        checksum::compute_file_checksum(&upload.path)
            .await
            .map_err(PipelineError::Hash)
    }

    async fn dedup_stage(&self, hash: &str) -> Result<Option<Upload>, PipelineError> {
        let existing = find_by_hash::handle(
            self.db.clone(),
            FindUploadByHashQuery {
                file_hash: hash.to_string(),
            },
        )
        .await?;
        Ok(existing)
    }

    async fn transcode_stage(
        &self,
        upload: &PendingUpload,
    ) -> Result<transcode::TranscodeSummary, PipelineError> {
        transcode::transcode_csv_to_json(&upload.path)
            .await
            .map_err(PipelineError::Transcode)
    }

    /// Register the upload. Losing a race on the hash index turns this run into a
    /// duplicate of the winner.
    async fn register_stage(
        &self,
        upload: &PendingUpload,
        hash: String,
    ) -> Result<PipelineOutcome, PipelineError> {
        let command = CreateUploadCommand {
            original_name: upload.original_name.clone(),
            filename: upload.filename.clone(),
            file_hash: hash.clone(),
        };

        match create_upload::handle(self.db.clone(), command).await {
            Ok(created) => Ok(PipelineOutcome::Created(created)),
            Err(CreateUploadError::Duplicate(_)) => {
                warn!(file_hash = %hash, "Concurrent upload of identical content, reusing winner");
                match self.dedup_stage(&hash).await? {
                    Some(winner) => Ok(PipelineOutcome::Duplicate(winner)),
                    None => Err(PipelineError::Register(CreateUploadError::Duplicate(hash))),
                }
            },
            Err(e) => Err(PipelineError::Register(e)),
        }
    }

    async fn finalize(
        &self,
        job_id: i64,
        upload: &PendingUpload,
        result: &Result<PipelineOutcome, PipelineError>,
    ) {
        let command = match result {
            Ok(PipelineOutcome::Created(created)) => {
                info!(upload_id = created.id, "Job completed");
                UpdateJobCommand::new(job_id)
                    .status(JobStatus::Success)
                    .file_path(upload.path.to_string_lossy())
            },
            Ok(PipelineOutcome::Duplicate(existing)) => {
                info!(upload_id = existing.id, "Duplicate content, reusing existing upload");
                if let Err(e) = self.storage.delete_artifacts(&upload.path).await {
                    warn!(error = %e, path = %upload.path.display(), "Failed to remove redundant upload");
                }
                UpdateJobCommand::new(job_id)
                    .status(JobStatus::Success)
                    .file_path(self.storage.path_for(&existing.filename).to_string_lossy())
            },
            Err(e @ PipelineError::Start(_)) => {
                error!(error = %e, "Job could not be started");
                self.discard(&upload.path, "upload").await;
                UpdateJobCommand::new(job_id)
                    .status(JobStatus::Error)
                    .error(e.to_string())
            },
            Err(e) => {
                warn!(error = %e, "Job failed");
                if matches!(e, PipelineError::Register(_)) {
                    self.discard(&transcode::artifact_path(&upload.path), "artifact").await;
                }
                UpdateJobCommand::new(job_id)
                    .status(JobStatus::Error)
                    .error(e.to_string())
            },
        };

        if let Err(e) = update_job::handle(self.db.clone(), command).await {
            error!(error = %e, "Failed to record job outcome");
        }
    }

    async fn discard(&self, path: &std::path::Path, what: &str) {
        if let Err(e) = self.storage.delete_file(path).await {
            warn!(error = %e, path = %path.display(), "Failed to remove {what}");
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "job task panicked".to_string()
    }
}
