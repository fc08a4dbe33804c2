//! csvjob server library
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//!
//! HTTP service that accepts CSV uploads, converts them to JSON on a background
//! task and serves the results.
//!
//! # Overview
//!
//! - **Upload**: the CSV is streamed to the upload directory and a `Pending` job is
//!   created; the caller gets the obfuscated job id straight away
//! - **Conversion**: the job is hashed, deduplicated against earlier uploads and
//!   transcoded to a JSON array of row objects
//! - **Polling**: `GET /api/jobs/jobStatus/:jobId` reports progress through the
//!   HTTP status code
//! - **Management**: list, download, delete one, delete all
//! - **Retention**: jobs older than `JOB_CLEANUP_DAYS` are swept daily
//!
//! # Architecture
//!
//! Features are vertical CQRS slices (`features/<name>/{commands,queries,routes}`).
//! Commands write to the SQLite store, queries only read. Both implement
//! `mediator::Request` and are registered in [`cqrs::build_mediator`].
//!
//! # Example
//!
//! ```no_run
//! use csvjob_server::{api, config::Config, db, features::{FeatureState, shared::IdCodec}, storage::Storage};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let pool = db::create_pool(&config.database).await?;
//! db::run_migrations(&pool).await?;
//! let storage = Storage::new(config.storage.clone()).await?;
//! let ids = IdCodec::new(&config.security.secret_key)?;
//! let app = api::create_router(FeatureState::new(pool, storage, ids), &config);
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;
pub mod storage;

pub use error::AppError;
