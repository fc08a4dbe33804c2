//! Job routes
//!
//! Read-only polling of job status. The HTTP status code mirrors the job state.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::queries::get_job::{self, GetJobError, GetJobQuery};
use crate::api::response::ErrorResponse;
use crate::features::shared::id_codec::IdCodecError;
use crate::features::FeatureState;
use crate::models::JobStatus;

pub fn jobs_routes() -> Router<FeatureState> {
    Router::new().route("/jobStatus/:job_id", get(job_status))
}

#[derive(Debug, Serialize)]
struct JobStatusResponse {
    status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn status_code(status: JobStatus) -> StatusCode {
    match status {
        JobStatus::Pending | JobStatus::Loading => StatusCode::ACCEPTED,
        JobStatus::Success => StatusCode::OK,
        JobStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// GET /jobs/jobStatus/:job_id
#[tracing::instrument(skip(state))]
async fn job_status(
    State(state): State<FeatureState>,
    Path(job_id): Path<String>,
) -> Result<Response, JobApiError> {
    let id = state.ids.decode(&job_id)?;
    let job = get_job::handle(state.db.clone(), GetJobQuery { id }).await?;

    let body = JobStatusResponse {
        status: job.status,
        error: job.error,
    };
    Ok((status_code(job.status), Json(body)).into_response())
}

#[derive(Debug, thiserror::Error)]
enum JobApiError {
    #[error(transparent)]
    InvalidId(#[from] IdCodecError),
    #[error(transparent)]
    GetJob(#[from] GetJobError),
}

impl IntoResponse for JobApiError {
    fn into_response(self) -> Response {
        match self {
            JobApiError::InvalidId(_) => {
                let error = ErrorResponse::new("INVALID_ID", "Invalid job ID");
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            JobApiError::GetJob(GetJobError::NotFound) => {
                let error = ErrorResponse::new("NOT_FOUND", "Job not found");
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            JobApiError::GetJob(GetJobError::Database(e)) => {
                tracing::error!("Database error while fetching job: {}", e);
                let error = ErrorResponse::new("DATABASE_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(status_code(JobStatus::Pending), StatusCode::ACCEPTED);
        assert_eq!(status_code(JobStatus::Loading), StatusCode::ACCEPTED);
        assert_eq!(status_code(JobStatus::Success), StatusCode::OK);
        assert_eq!(status_code(JobStatus::Error), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
