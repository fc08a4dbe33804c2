//! Fixtures for database and storage tests
//!
//! ```rust,ignore
//! use crate::features::shared::test_helpers::*;
//!
//! #[sqlx::test]
//! async fn test_something(pool: SqlitePool) -> sqlx::Result<()> {
//!     let (storage, _dir) = test_storage().await;
//!     let upload = insert_upload(&pool, "people.csv", &"a".repeat(64)).await?;
//!     // ... test logic ...
//!     Ok(())
//! }
//! ```

use crate::features::shared::id_codec::IdCodec;
use crate::features::FeatureState;
use crate::models::{JobStatus, Upload};
use crate::storage::{Storage, StorageConfig};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tempfile::TempDir;

pub const TEST_SECRET: &str = "test-secret";

/// Storage rooted in a fresh temp dir; keep the `TempDir` alive for the test
pub async fn test_storage() -> (Storage, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(StorageConfig::new(dir.path())).await.unwrap();
    (storage, dir)
}

pub async fn test_state(pool: SqlitePool) -> (FeatureState, TempDir) {
    let (storage, dir) = test_storage().await;
    let ids = IdCodec::new(TEST_SECRET).unwrap();
    (FeatureState::new(pool, storage, ids), dir)
}

/// Insert an upload record with a generated storage name
pub async fn insert_upload(pool: &SqlitePool, original_name: &str, file_hash: &str) -> sqlx::Result<Upload> {
    let now = Utc::now();
    sqlx::query_as::<_, Upload>(
        r#"
        INSERT INTO uploads (original_name, filename, file_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, original_name, filename, file_hash, created_at, updated_at
        "#,
    )
    .bind(original_name)
    .bind(Storage::generate_name())
    .bind(file_hash)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Insert a job in any state, bypassing the transition rules
pub async fn insert_job(pool: &SqlitePool, status: JobStatus, file_path: &str) -> sqlx::Result<i64> {
    insert_job_row(pool, status, file_path, Utc::now()).await
}

/// Insert a job with a backdated `created_at`
pub async fn insert_job_at(pool: &SqlitePool, status: JobStatus, created_at: DateTime<Utc>) -> sqlx::Result<i64> {
    insert_job_row(pool, status, "uploads/old.csv", created_at).await
}

async fn insert_job_row(
    pool: &SqlitePool,
    status: JobStatus,
    file_path: &str,
    created_at: DateTime<Utc>,
) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        r#"
        INSERT INTO jobs (status, file_path, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(status)
    .bind(file_path)
    .bind(created_at)
    .bind(created_at)
    .fetch_one(pool)
    .await
}
