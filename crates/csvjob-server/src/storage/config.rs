use crate::config::{DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_UPLOAD_DIRECTORY};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `<generated>.csv` uploads and their `.json` artifacts
    pub upload_dir: PathBuf,
    pub max_file_size_mb: u64,
}

impl StorageConfig {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
        }
    }

    pub fn with_max_file_size_mb(mut self, mb: u64) -> Self {
        self.max_file_size_mb = mb;
        self
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(DEFAULT_UPLOAD_DIRECTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
        assert_eq!(config.max_file_size_bytes(), 200 * 1024 * 1024);
    }

    #[test]
    fn test_with_max_file_size() {
        let config = StorageConfig::new("/data").with_max_file_size_mb(1);
        assert_eq!(config.upload_dir, PathBuf::from("/data"));
        assert_eq!(config.max_file_size_bytes(), 1_048_576);
    }
}
