pub mod download;
pub mod find_by_hash;
pub mod list;
pub mod stats;

pub use download::{DownloadFileError, DownloadFileQuery, DownloadFileResponse};
pub use find_by_hash::{FindUploadByHashError, FindUploadByHashQuery};
pub use list::{ListUploadsError, ListUploadsQuery};
pub use stats::{UploadStats, UploadStatsError, UploadStatsQuery};
