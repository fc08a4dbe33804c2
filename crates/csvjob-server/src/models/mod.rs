//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle of a conversion job
///
/// `Pending -> Loading -> Success | Error`, or `Pending -> Error` when the job
/// never starts. Success and Error are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Loading,
    Success,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Error)
    }

    /// Whether a job in `self` may move to `next`
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Loading)
                | (JobStatus::Pending, JobStatus::Error)
                | (JobStatus::Loading, JobStatus::Success)
                | (JobStatus::Loading, JobStatus::Error)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Loading => "loading",
            JobStatus::Success => "success",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of "accept file, convert" work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i64,
    pub status: JobStatus,
    /// Source CSV; the JSON artifact sits beside it with a `.json` extension
    pub file_path: String,
    /// Failure reason, only set when `status` is `Error`
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A converted, deduplicated upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Upload {
    pub id: i64,
    /// Client-supplied name at upload time
    pub original_name: String,
    /// Server-generated storage name of the CSV inside the upload directory
    pub filename: String,
    /// SHA-256 of the CSV bytes, unique across uploads
    pub file_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::Loading,
        JobStatus::Success,
        JobStatus::Error,
    ];

    #[test]
    fn test_forward_transitions() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Loading));
        assert!(JobStatus::Loading.can_transition_to(JobStatus::Success));
        assert!(JobStatus::Loading.can_transition_to(JobStatus::Error));
    }

    #[test]
    fn test_pending_can_fail_directly() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Error));
    }

    #[test]
    fn test_terminal_states_never_leave() {
        for from in [JobStatus::Success, JobStatus::Error] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn test_no_skipping_loading() {
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Success));
        assert!(!JobStatus::Loading.can_transition_to(JobStatus::Pending));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&JobStatus::Loading).unwrap(), "\"loading\"");
        assert_eq!(JobStatus::Success.to_string(), "success");
    }
}
