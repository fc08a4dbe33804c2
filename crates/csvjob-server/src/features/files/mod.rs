//! Files feature module
//!
//! Upload registry commands and queries, plus the upload, download, list and
//! delete routes.

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{UploadFileCommand, UploadFileError, UploadFileResponse};

pub use queries::{DownloadFileError, DownloadFileQuery, DownloadFileResponse};

pub use routes::files_routes;
