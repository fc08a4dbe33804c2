//! Jobs feature module
//!
//! Job store commands and queries, the conversion orchestrator, the retention
//! sweeper and the status polling route.

pub mod commands;
pub mod orchestrator;
pub mod queries;
pub mod routes;
pub mod sweeper;


pub use orchestrator::{JobOrchestrator, PendingUpload, PipelineError, PipelineOutcome};
pub use routes::jobs_routes;
pub use sweeper::RetentionSweeper;
