use crate::api::response::ErrorResponse;
use crate::features::shared::id_codec::IdCodecError;
use crate::features::FeatureState;
use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tokio_util::io::ReaderStream;

use super::{
    commands::{
        delete::{self as delete_file, DeleteFileCommand, DeleteFileError},
        delete_all::{self, DeleteAllFilesCommand, DeleteAllFilesError},
        upload::{self, UploadFileCommand, UploadFileError},
    },
    queries::{
        download::{self, DownloadFileError, DownloadFileQuery},
        list::{self, ListUploadsError, ListUploadsQuery},
        stats::{self, UploadStatsError, UploadStatsQuery},
    },
};

pub fn files_routes() -> Router<FeatureState> {
    Router::new()
        .route("/upload", post(upload_file))
        .route("/download/:job_id", get(download_file))
        .route("/list", get(list_files))
        .route("/stats", get(upload_stats))
        .route("/delete/:id", delete(delete_one))
        .route("/deleteAll", delete(delete_all_files))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadAccepted {
    job_id: String,
}

#[derive(Debug, Serialize)]
struct FileListItem {
    id: String,
    name: String,
}

/// POST /files/upload
///
/// Streams the multipart `file` field to disk and answers 202 as soon as the
/// conversion job exists.
#[tracing::instrument(skip(state, multipart))]
async fn upload_file(
    State(state): State<FeatureState>,
    mut multipart: Multipart,
) -> Result<Response, FileApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let command = UploadFileCommand {
            original_name: field.file_name().unwrap_or_default().to_string(),
            content_type: field.content_type().map(str::to_string),
        };

        let response = upload::handle(&state.storage, &state.orchestrator, command, field).await?;

        let body = UploadAccepted {
            job_id: state.ids.encode(response.job_id),
        };
        return Ok((StatusCode::ACCEPTED, Json(body)).into_response());
    }

    Err(FileApiError::Upload(UploadFileError::FileRequired))
}

/// GET /files/download/:job_id
#[tracing::instrument(skip(state))]
async fn download_file(
    State(state): State<FeatureState>,
    Path(job_id): Path<String>,
) -> Result<Response, FileApiError> {
    let job_id = state.ids.decode(&job_id)?;
    let artifact = download::handle(state.db.clone(), DownloadFileQuery { job_id }).await?;

    let file = tokio::fs::File::open(&artifact.path).await.map_err(|e| {
        tracing::error!(path = %artifact.path.display(), error = %e, "Failed to open artifact");
        FileApiError::Download(DownloadFileError::ArtifactMissing)
    })?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// GET /files/list
#[tracing::instrument(skip(state))]
async fn list_files(State(state): State<FeatureState>) -> Result<Response, FileApiError> {
    let uploads = list::handle(state.db.clone(), ListUploadsQuery).await?;

    let items: Vec<FileListItem> = uploads
        .into_iter()
        .map(|upload| FileListItem {
            id: state.ids.encode(upload.id),
            name: upload.original_name,
        })
        .collect();

    Ok(Json(items).into_response())
}

/// GET /files/stats
#[tracing::instrument(skip(state))]
async fn upload_stats(State(state): State<FeatureState>) -> Result<Response, FileApiError> {
    let stats = stats::handle(state.db.clone(), UploadStatsQuery).await?;
    Ok(Json(stats).into_response())
}

/// DELETE /files/delete/:id
#[tracing::instrument(skip(state))]
async fn delete_one(
    State(state): State<FeatureState>,
    Path(id): Path<String>,
) -> Result<Response, FileApiError> {
    let id = state.ids.decode(&id)?;
    delete_file::handle(state.db.clone(), &state.storage, DeleteFileCommand { id }).await?;
    Ok(StatusCode::OK.into_response())
}

/// DELETE /files/deleteAll
#[tracing::instrument(skip(state))]
async fn delete_all_files(State(state): State<FeatureState>) -> Result<Response, FileApiError> {
    delete_all::handle(state.db.clone(), &state.storage, DeleteAllFilesCommand).await?;
    Ok(StatusCode::OK.into_response())
}

#[derive(Debug, thiserror::Error)]
enum FileApiError {
    #[error(transparent)]
    InvalidId(#[from] IdCodecError),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Upload(#[from] UploadFileError),
    #[error(transparent)]
    Download(#[from] DownloadFileError),
    #[error(transparent)]
    List(#[from] ListUploadsError),
    #[error(transparent)]
    Stats(#[from] UploadStatsError),
    #[error(transparent)]
    Delete(#[from] DeleteFileError),
    #[error(transparent)]
    DeleteAll(#[from] DeleteAllFilesError),
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(code, message))).into_response()
}

impl IntoResponse for FileApiError {
    fn into_response(self) -> Response {
        match self {
            FileApiError::InvalidId(_) => {
                error_response(StatusCode::BAD_REQUEST, "INVALID_ID", "Invalid file ID")
            },
            FileApiError::Multipart(e) => {
                tracing::warn!("Malformed multipart request: {}", e);
                error_response(e.status(), "INVALID_MULTIPART", e.body_text())
            },
            FileApiError::Upload(e) => match e {
                UploadFileError::FileRequired | UploadFileError::NotCsv => {
                    error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
                },
                UploadFileError::TooLarge { .. } => {
                    error_response(StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE", e.to_string())
                },
                UploadFileError::Storage(_) | UploadFileError::Job(_) => {
                    tracing::error!("Upload failed: {}", e);
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "UPLOAD_ERROR", "Upload failed")
                },
            },
            FileApiError::Download(e) => match e {
                DownloadFileError::JobNotFound | DownloadFileError::ArtifactMissing => {
                    error_response(StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
                },
                DownloadFileError::NotReady(_) => {
                    error_response(StatusCode::BAD_REQUEST, "NOT_READY", e.to_string())
                },
                DownloadFileError::Database(err) => {
                    tracing::error!("Database error during download: {}", err);
                    error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DATABASE_ERROR",
                        "A database error occurred",
                    )
                },
            },
            FileApiError::List(e) => {
                tracing::error!("Failed to list uploads: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", "Failed to list files")
            },
            FileApiError::Stats(e) => {
                tracing::error!("Failed to count uploads: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", "Failed to load stats")
            },
            FileApiError::Delete(e) => match e {
                DeleteFileError::NotFound(_) => {
                    error_response(StatusCode::NOT_FOUND, "NOT_FOUND", "File not found")
                },
                DeleteFileError::Disk(_) | DeleteFileError::RollbackFailed(_) => {
                    tracing::error!("Delete failed: {}", e);
                    error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DELETE_FAILED",
                        "Local file deletion failed",
                    )
                },
                DeleteFileError::Database(err) => {
                    tracing::error!("Database error during delete: {}", err);
                    error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DATABASE_ERROR",
                        "A database error occurred",
                    )
                },
            },
            FileApiError::DeleteAll(e) => {
                tracing::error!("Delete all failed: {}", e);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DELETE_FAILED",
                    "Failed to delete all files",
                )
            },
        }
    }
}
