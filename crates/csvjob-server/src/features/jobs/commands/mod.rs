//! Job store commands

pub mod create;
pub mod sweep;
pub mod update;

pub use create::{CreateJobCommand, CreateJobError};
pub use sweep::{SweepJobsCommand, SweepJobsError, SweepJobsResponse};
pub use update::{UpdateJobCommand, UpdateJobError};
