//! Content hashing used as the upload dedup key
//!
//! Files are folded through SHA-256 in fixed-size chunks, so memory use does not
//! depend on file size. Digests are lowercase hex.

use crate::error::{CsvJobError, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK_SIZE: usize = 64 * 1024;

/// Compute the SHA-256 digest of a file on disk
///
/// A missing file yields [`CsvJobError::FileNotFound`]; any other read failure
/// yields [`CsvJobError::Io`].
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub async fn compute_file_checksum(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| CsvJobError::from_io(e, path))?;
    compute_reader_checksum(&mut file).await
}

/// Compute the SHA-256 digest of any async byte source
pub async fn compute_reader_checksum<R>(reader: &mut R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 digest of an in-memory buffer
pub fn compute_checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HELLO_WORLD_SHA256: &str =
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_compute_checksum_buffer() {
        assert_eq!(compute_checksum(b"hello world"), HELLO_WORLD_SHA256);
    }

    #[tokio::test]
    async fn test_reader_matches_buffer() {
        let data = b"hello world".to_vec();
        let mut reader = data.as_slice();
        let checksum = compute_reader_checksum(&mut reader).await.unwrap();
        assert_eq!(checksum, HELLO_WORLD_SHA256);
    }

    #[tokio::test]
    async fn test_file_checksum_is_deterministic() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"a,b\n1,2\n").unwrap();

        let first = compute_file_checksum(file.path()).await.unwrap();
        let second = compute_file_checksum(file.path()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, compute_checksum(b"a,b\n1,2\n"));
    }

    #[tokio::test]
    async fn test_identical_content_different_names() {
        let dir = tempfile::tempdir().unwrap();
        let left = dir.path().join("left.csv");
        let right = dir.path().join("completely-different-name.csv");
        std::fs::write(&left, b"x,y\n3,4\n").unwrap();
        std::fs::write(&right, b"x,y\n3,4\n").unwrap();

        assert_eq!(
            compute_file_checksum(&left).await.unwrap(),
            compute_file_checksum(&right).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_large_file_spans_chunks() {
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();

        let checksum = compute_file_checksum(file.path()).await.unwrap();
        assert_eq!(checksum, compute_checksum(&data));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = compute_file_checksum(dir.path().join("nope.csv")).await;
        assert!(matches!(result, Err(CsvJobError::FileNotFound(_))));
    }
}
