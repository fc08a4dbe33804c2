//! csvjob common library
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//!
//! File-level building blocks for the csvjob server, with no HTTP or database
//! knowledge:
//!
//! - **Checksums**: streaming SHA-256 content hashes used as dedup keys
//! - **Transcoding**: streaming CSV to JSON array conversion
//! - **Logging**: tracing subscriber setup shared by binaries
//! - **Errors**: [`CsvJobError`] and the [`Result`] alias
//!
//! # Example
//!
//! ```no_run
//! use csvjob_common::{checksum, transcode};
//!
//! # async fn example() -> csvjob_common::Result<()> {
//! let digest = checksum::compute_file_checksum("uploads/3f2c.csv").await?;
//! let summary = transcode::transcode_csv_to_json("uploads/3f2c.csv").await?;
//! tracing::info!(%digest, rows = summary.rows, "converted");
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod transcode;

pub use error::{CsvJobError, Result};
