use csvjob_common::transcode::artifact_path;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

pub mod config;

pub use config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File exceeds the maximum allowed size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Failed to read upload stream: {0}")]
    Stream(String),

    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A CSV written into the upload directory
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Generated name inside the upload directory
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Local upload directory holding CSV sources and their JSON artifacts
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    max_file_size: u64,
}

impl Storage {
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        tokio::fs::create_dir_all(&config.upload_dir).await?;

        info!(
            upload_dir = %config.upload_dir.display(),
            max_file_size_mb = config.max_file_size_mb,
            "Storage initialized"
        );

        Ok(Self {
            max_file_size: config.max_file_size_bytes(),
            root: config.upload_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Random, collision resistant storage name; always ends in `.csv`
    pub fn generate_name() -> String {
        format!("{}.csv", uuid::Uuid::new_v4())
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Write `stream` to a freshly named file, enforcing the size limit
    ///
    /// On any failure the partial file is removed.
    #[instrument(skip(self, stream))]
    pub async fn save_stream<S, B, E>(&self, stream: S) -> StorageResult<StoredFile>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: std::fmt::Display,
    {
        let filename = Self::generate_name();
        let path = self.path_for(&filename);

        match self.write_limited(&path, stream).await {
            Ok(size) => {
                debug!(path = %path.display(), size, "Upload stored");
                Ok(StoredFile { filename, path, size })
            },
            Err(e) => {
                if let Err(cleanup) = self.delete_file(&path).await {
                    warn!(error = %cleanup, path = %path.display(), "Failed to remove partial upload");
                }
                Err(e)
            },
        }
    }

    async fn write_limited<S, B, E>(&self, path: &Path, stream: S) -> StorageResult<u64>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: std::fmt::Display,
    {
        futures::pin_mut!(stream);

        let mut file = tokio::fs::File::create(path).await?;
        let mut size = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StorageError::Stream(e.to_string()))?;
            let bytes = chunk.as_ref();
            size += bytes.len() as u64;
            if size > self.max_file_size {
                return Err(StorageError::TooLarge { limit: self.max_file_size });
            }
            file.write_all(bytes).await?;
        }

        file.flush().await?;
        Ok(size)
    }

    /// Remove a file. Returns `Ok(false)` when it was already gone.
    pub async fn delete_file(&self, path: &Path) -> StorageResult<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a CSV and its JSON artifact
    ///
    /// Missing files count as removed. Both deletions are attempted; an error is
    /// returned only when neither file could be removed. A single leftover is
    /// logged.
    #[instrument(skip(self), fields(csv = %csv_path.display()))]
    pub async fn delete_artifacts(&self, csv_path: &Path) -> StorageResult<()> {
        let csv = self.delete_file(csv_path).await;
        let json = self.delete_file(&artifact_path(csv_path)).await;

        match (csv, json) {
            (Ok(csv_removed), Ok(json_removed)) => {
                debug!(csv_removed, json_removed, "Artifacts deleted");
                Ok(())
            },
            (Err(e), Ok(_)) => {
                warn!(error = %e, "CSV source left behind, JSON artifact deleted");
                Ok(())
            },
            (Ok(_), Err(e)) => {
                warn!(error = %e, "JSON artifact left behind, CSV source deleted");
                Ok(())
            },
            (Err(csv_err), Err(json_err)) => {
                warn!(error = %json_err, "JSON artifact could not be deleted");
                Err(csv_err)
            },
        }
    }

    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn storage(dir: &Path, max_mb: u64) -> Storage {
        Storage::new(StorageConfig::new(dir).with_max_file_size_mb(max_mb))
            .await
            .unwrap()
    }

    fn chunks(parts: Vec<Vec<u8>>) -> impl Stream<Item = Result<Vec<u8>, String>> {
        stream::iter(parts.into_iter().map(Ok))
    }

    #[test]
    fn test_generated_names_are_unique_csv() {
        let a = Storage::generate_name();
        let b = Storage::generate_name();
        assert_ne!(a, b);
        assert!(a.ends_with(".csv"));
    }

    #[tokio::test]
    async fn test_new_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let storage = storage(&nested, 1).await;
        assert!(nested.is_dir());
        assert_eq!(storage.root(), nested.as_path());
    }

    #[tokio::test]
    async fn test_save_stream_writes_all_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path(), 1).await;

        let stored = storage
            .save_stream(chunks(vec![b"a,b\n".to_vec(), b"1,2\n".to_vec()]))
            .await
            .unwrap();

        assert_eq!(stored.size, 8);
        assert_eq!(stored.path, dir.path().join(&stored.filename));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_save_stream_rejects_oversize_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path(), 1).await;
        let big = vec![b'x'; 700 * 1024];

        let err = storage
            .save_stream(chunks(vec![big.clone(), big]))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::TooLarge { limit: 1_048_576 }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_save_stream_propagates_stream_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path(), 1).await;
        let failing = stream::iter(vec![Ok::<&[u8], String>(b"a,b\n"), Err("reset".to_string())]);

        let err = storage.save_stream(failing).await.unwrap_err();

        assert!(matches!(err, StorageError::Stream(ref msg) if msg == "reset"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_delete_file_missing_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path(), 1).await;
        let removed = storage.delete_file(&dir.path().join("gone.csv")).await.unwrap();
        assert!(!removed);
    }

    #[tokio::test]
    async fn test_delete_artifacts_removes_pair() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path(), 1).await;
        let csv = dir.path().join("f.csv");
        std::fs::write(&csv, b"a\n1\n").unwrap();
        std::fs::write(dir.path().join("f.json"), b"[]").unwrap();

        storage.delete_artifacts(&csv).await.unwrap();

        assert!(!storage.exists(&csv).await);
        assert!(!storage.exists(&dir.path().join("f.json")).await);
    }

    #[tokio::test]
    async fn test_delete_artifacts_tolerates_one_leftover() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path(), 1).await;
        // A directory cannot be removed with remove_file
        let csv = dir.path().join("locked.csv");
        std::fs::create_dir(&csv).unwrap();
        std::fs::write(dir.path().join("locked.json"), b"[]").unwrap();

        storage.delete_artifacts(&csv).await.unwrap();

        assert!(storage.exists(&csv).await);
        assert!(!storage.exists(&dir.path().join("locked.json")).await);
    }

    #[tokio::test]
    async fn test_delete_artifacts_fails_when_both_stay() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path(), 1).await;
        let csv = dir.path().join("locked.csv");
        std::fs::create_dir(&csv).unwrap();
        std::fs::create_dir(dir.path().join("locked.json")).unwrap();

        assert!(storage.delete_artifacts(&csv).await.is_err());
    }
}
