//! Database error handling utilities
//!
//! ```rust,ignore
//! use csvjob_server::features::shared::error_helpers::map_unique_violation;
//!
//! sqlx::query(...)
//!     .execute(&pool)
//!     .await
//!     .map_err(|e| map_unique_violation(e, CreateUploadError::Duplicate(hash), CreateUploadError::Database))?;
//! ```

use sqlx::Error as SqlxError;

/// Check if the error is a unique constraint violation
pub fn is_unique_violation(error: &SqlxError) -> bool {
    if let SqlxError::Database(db_err) = error {
        return db_err.is_unique_violation();
    }
    false
}

/// Return `unique_error` for a unique constraint violation, otherwise wrap the error
pub fn map_unique_violation<E, F>(error: SqlxError, unique_error: E, default_wrapper: F) -> E
where
    F: FnOnce(SqlxError) -> E,
{
    if is_unique_violation(&error) {
        unique_error
    } else {
        default_wrapper(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    #[derive(Debug)]
    enum TestError {
        Duplicate,
        Database(SqlxError),
    }

    async fn insert_hash(pool: &SqlitePool, hash: &str) -> Result<(), SqlxError> {
        sqlx::query(
            "INSERT INTO uploads (original_name, filename, file_hash, created_at, updated_at)
             VALUES ('a.csv', 'a.csv', ?, datetime('now'), datetime('now'))",
        )
        .bind(hash)
        .execute(pool)
        .await
        .map(|_| ())
    }

    #[sqlx::test]
    async fn test_detects_unique_violation(pool: SqlitePool) -> sqlx::Result<()> {
        insert_hash(&pool, "abc").await?;
        let err = insert_hash(&pool, "abc").await.unwrap_err();

        assert!(is_unique_violation(&err));
        assert!(matches!(
            map_unique_violation(err, TestError::Duplicate, TestError::Database),
            TestError::Duplicate
        ));
        Ok(())
    }

    #[test]
    fn test_other_errors_are_wrapped() {
        let err = SqlxError::RowNotFound;
        assert!(!is_unique_violation(&err));
        assert!(matches!(
            map_unique_violation(err, TestError::Duplicate, TestError::Database),
            TestError::Database(SqlxError::RowNotFound)
        ));
    }
}
