//! csvjob server - main entry point

use anyhow::{Context, Result};
use csvjob_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tracing::{info, warn};

use csvjob_server::{
    api,
    config::Config,
    db,
    features::{jobs::RetentionSweeper, shared::IdCodec, FeatureState},
    storage::Storage,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("csvjob-server".to_string())
        .filter_directives("csvjob_server=debug,tower_http=debug,sqlx=info".to_string())
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting csvjob server");

    let config = Config::load().context("Failed to load configuration")?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db_pool = db::create_pool(&config.database)
        .await
        .context("Failed to open database")?;
    info!("Database connection pool established");

    db::run_migrations(&db_pool).await?;

    let storage = Storage::new(config.storage.clone())
        .await
        .context("Failed to prepare upload directory")?;
    let ids = IdCodec::new(&config.security.secret_key)?;

    let sweeper = RetentionSweeper::new(db_pool.clone(), &config.retention).start();

    let state = FeatureState::new(db_pool, storage, ids);
    let orchestrator = state.orchestrator.clone();
    let app = api::create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    sweeper.abort();

    let drain_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    if !orchestrator.shutdown(drain_timeout).await {
        warn!("Exiting with unfinished jobs");
    }
    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
