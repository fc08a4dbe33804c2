pub use mediator::DefaultAsyncMediator;
use sqlx::SqlitePool;

pub mod middleware;

pub type AppMediator = DefaultAsyncMediator;

/// Register every pool-backed command and query handler
///
/// Operations that also touch the upload directory (upload, delete, delete-all)
/// need a [`crate::storage::Storage`] and are called directly by their routes.
pub fn build_mediator(pool: SqlitePool) -> AppMediator {
    DefaultAsyncMediator::builder()
        // Jobs
        .add_handler({
            let pool = pool.clone();
            move |cmd| {
                let pool = pool.clone();
                async move { crate::features::jobs::commands::create::handle(pool, cmd).await }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |cmd| {
                let pool = pool.clone();
                async move { crate::features::jobs::commands::update::handle(pool, cmd).await }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |cmd| {
                let pool = pool.clone();
                async move { crate::features::jobs::commands::sweep::handle(pool, cmd).await }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::jobs::queries::get_job::handle(pool, query).await }
            }
        })
        // Uploads
        .add_handler({
            let pool = pool.clone();
            move |cmd| {
                let pool = pool.clone();
                async move { crate::features::files::commands::create::handle(pool, cmd).await }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |cmd| {
                let pool = pool.clone();
                async move { crate::features::files::commands::remove::handle(pool, cmd).await }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |cmd| {
                let pool = pool.clone();
                async move { crate::features::files::commands::reinsert::handle(pool, cmd).await }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |cmd| {
                let pool = pool.clone();
                async move { crate::features::files::commands::remove_all::handle(pool, cmd).await }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::files::queries::find_by_hash::handle(pool, query).await }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::files::queries::list::handle(pool, query).await }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::files::queries::stats::handle(pool, query).await }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::files::queries::download::handle(pool, query).await }
            }
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::jobs::commands::create::{CreateJobCommand, CreateJobError};
    use crate::features::jobs::queries::get_job::{GetJobError, GetJobQuery};
    use crate::models::{Job, JobStatus};
    use mediator::AsyncMediator;
    use sqlx::sqlite::SqlitePoolOptions;

    // `AsyncMediator::send` blocks in place, which needs the multi-threaded runtime
    #[tokio::test(flavor = "multi_thread")]
    async fn test_mediator_dispatches_to_handlers() -> anyhow::Result<()> {
        // One connection keeps a single in-memory database alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        crate::db::MIGRATOR.run(&pool).await?;

        let mut mediator = build_mediator(pool);

        let created: Result<Job, CreateJobError> = mediator
            .send(CreateJobCommand::new("uploads/a.csv"))
            .await
            .unwrap();
        let created = created.unwrap();
        assert_eq!(created.status, JobStatus::Pending);

        let fetched: Result<Job, GetJobError> = mediator
            .send(GetJobQuery { id: created.id })
            .await
            .unwrap();
        assert_eq!(fetched.unwrap(), created);
        Ok(())
    }
}
