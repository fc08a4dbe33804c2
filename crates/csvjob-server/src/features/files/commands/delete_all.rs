use super::remove_all;
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Best-effort removal of every upload and its files
///
/// Records are always removed. File deletion failures are logged and counted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteAllFilesCommand;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteAllFilesResponse {
    pub deleted: u64,
    pub failed_files: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteAllFilesError {
    #[error("Failed to delete all files: {0}")]
    Database(#[from] remove_all::RemoveAllUploadsError),
}

#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: SqlitePool,
    storage: &Storage,
    _command: DeleteAllFilesCommand,
) -> Result<DeleteAllFilesResponse, DeleteAllFilesError> {
    let removed = remove_all::handle(pool, remove_all::RemoveAllUploadsCommand).await?;

    let mut response = DeleteAllFilesResponse {
        deleted: removed.len() as u64,
        failed_files: 0,
    };

    for upload in &removed {
        let csv_path = storage.path_for(&upload.filename);
        if let Err(e) = storage.delete_artifacts(&csv_path).await {
            tracing::error!(filename = %upload.filename, error = %e, "Failed to delete file");
            response.failed_files += 1;
        }
    }

    tracing::info!(
        deleted = response.deleted,
        failed_files = response.failed_files,
        "All uploads deleted"
    );

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{insert_upload, test_storage};

    #[sqlx::test]
    async fn test_continues_past_file_failures(pool: SqlitePool) -> sqlx::Result<()> {
        let (storage, _dir) = test_storage().await;
        let ok = insert_upload(&pool, "ok.csv", &"1".repeat(64)).await?;
        insert_upload(&pool, "gone.csv", &"2".repeat(64)).await?;
        let stuck = insert_upload(&pool, "stuck.csv", &"3".repeat(64)).await?;

        std::fs::write(storage.path_for(&ok.filename), b"a\n").unwrap();
        let stuck_csv = storage.path_for(&stuck.filename);
        std::fs::create_dir(&stuck_csv).unwrap();
        std::fs::create_dir(stuck_csv.with_extension("json")).unwrap();

        let response = handle(pool.clone(), &storage, DeleteAllFilesCommand).await.unwrap();

        assert_eq!(
            response,
            DeleteAllFilesResponse {
                deleted: 3,
                failed_files: 1
            }
        );
        assert!(!storage.path_for(&ok.filename).exists());

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM uploads")
            .fetch_one(&pool)
            .await?;
        assert_eq!(count, 0);
        Ok(())
    }
}
