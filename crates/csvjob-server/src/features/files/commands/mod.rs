pub mod create;
pub mod delete;
pub mod delete_all;
pub mod reinsert;
pub mod remove;
pub mod remove_all;
pub mod upload;

pub use create::{CreateUploadCommand, CreateUploadError};
pub use delete::{DeleteFileCommand, DeleteFileError, DeleteFileResponse};
pub use delete_all::{DeleteAllFilesCommand, DeleteAllFilesError, DeleteAllFilesResponse};
pub use reinsert::{ReinsertUploadCommand, ReinsertUploadError};
pub use remove::{RemoveUploadCommand, RemoveUploadError};
pub use remove_all::{RemoveAllUploadsCommand, RemoveAllUploadsError};
pub use upload::{UploadFileCommand, UploadFileError, UploadFileResponse};
