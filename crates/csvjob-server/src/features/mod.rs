//! Feature slices of the csvjob API
//!
//! Each feature is a vertical slice with its own `commands/`, `queries/` and
//! `routes.rs`:
//!
//! - **files**: upload registry, upload/download/list/delete routes
//! - **jobs**: job store, conversion orchestrator, retention sweeper, status route
//! - **shared**: id obfuscation and database error helpers
//!
//! Commands and queries implement `mediator::Request`, see [`crate::cqrs`].

pub mod files;
pub mod jobs;
pub mod shared;

use crate::storage::Storage;
use axum::{extract::DefaultBodyLimit, Router};
use jobs::JobOrchestrator;
use shared::id_codec::IdCodec;
use sqlx::SqlitePool;

/// Multipart framing overhead allowed on top of the file size limit
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub db: SqlitePool,
    /// Upload directory holding CSV sources and JSON artifacts
    pub storage: Storage,
    /// Obfuscates numeric ids in URLs and responses
    pub ids: IdCodec,
    pub orchestrator: JobOrchestrator,
}

impl FeatureState {
    pub fn new(db: SqlitePool, storage: Storage, ids: IdCodec) -> Self {
        let orchestrator = JobOrchestrator::new(db.clone(), storage.clone());
        Self {
            db,
            storage,
            ids,
            orchestrator,
        }
    }
}

/// Mounts `/files` and `/jobs`
pub fn router(state: FeatureState) -> Router<()> {
    let body_limit = state
        .storage
        .max_file_size()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .nest(
            "/files",
            files::files_routes()
                .layer(DefaultBodyLimit::max(body_limit))
                .with_state(state.clone()),
        )
        .nest("/jobs", jobs::jobs_routes().with_state(state))
}
