//! Periodic retention sweep of old jobs
//!
//! Runs once per interval and deletes job rows older than the configured number of
//! days. Upload files on disk are not touched.

use super::commands::sweep::{self, SweepJobsCommand, SweepJobsError};
use crate::config::RetentionConfig;
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{error, info};

pub struct RetentionSweeper {
    pool: SqlitePool,
    cleanup_days: i64,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(pool: SqlitePool, config: &RetentionConfig) -> Self {
        Self {
            pool,
            cleanup_days: config.cleanup_days,
            interval: Duration::from_secs(config.interval_secs),
        }
    }

    /// Delete jobs older than the retention period, returning how many went
    pub async fn sweep_once(&self) -> Result<u64, SweepJobsError> {
        let command = SweepJobsCommand::older_than_days(self.cleanup_days)?;
        let cutoff = command.cutoff;
        let response = sweep::handle(self.pool.clone(), command).await?;

        info!(deleted = response.deleted, %cutoff, "Cleaned up old jobs");
        Ok(response.deleted)
    }

    /// Spawn the sweep loop; the first sweep happens one interval after start
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_secs = self.interval.as_secs(),
                cleanup_days = self.cleanup_days,
                "Retention sweeper started"
            );

            let mut timer = interval_at(Instant::now() + self.interval, self.interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                timer.tick().await;
                if let Err(e) = self.sweep_once().await {
                    error!("Retention sweep failed: {}", e);
                }
            }
        })
    }
}
