//! Delete one upload together with its CSV/JSON pair
//!
//! The record is removed first. If the files cannot be removed the record is put
//! back, so a listed upload always has a chance of still being on disk.

use super::{reinsert, remove};
use crate::storage::{Storage, StorageError};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFileCommand {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFileResponse {
    pub id: i64,
    pub filename: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteFileError {
    #[error("Upload {0} not found")]
    NotFound(i64),
    #[error("Local file deletion failed: {0}")]
    Disk(#[source] StorageError),
    #[error("Local file deletion failed and the record could not be restored: {0}")]
    RollbackFailed(#[source] reinsert::ReinsertUploadError),
    #[error("Database error: {0}")]
    Database(#[from] remove::RemoveUploadError),
}

#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: SqlitePool,
    storage: &Storage,
    command: DeleteFileCommand,
) -> Result<DeleteFileResponse, DeleteFileError> {
    let upload = remove::handle(pool.clone(), remove::RemoveUploadCommand { id: command.id })
        .await?
        .ok_or(DeleteFileError::NotFound(command.id))?;

    let csv_path = storage.path_for(&upload.filename);

    if let Err(disk_err) = storage.delete_artifacts(&csv_path).await {
        tracing::warn!(
            upload_id = upload.id,
            error = %disk_err,
            "File deletion failed, restoring upload record"
        );

        reinsert::handle(pool, reinsert::ReinsertUploadCommand { upload })
            .await
            .map_err(DeleteFileError::RollbackFailed)?;

        return Err(DeleteFileError::Disk(disk_err));
    }

    tracing::info!(upload_id = upload.id, filename = %upload.filename, "Upload deleted");

    Ok(DeleteFileResponse {
        id: upload.id,
        filename: upload.filename,
    })
}
