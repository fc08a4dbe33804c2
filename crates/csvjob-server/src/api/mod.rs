//! HTTP surface: router assembly and the service-level endpoints

pub mod response;

use crate::config::Config;
use crate::error::AppError;
use crate::features::{self, FeatureState};
use crate::{db, middleware};
use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_http::compression::CompressionLayer;

/// Build the application router with all routes and middleware
///
/// Feature routes live under `/api`; `/` and `/health` sit at the root.
pub fn create_router(state: FeatureState, config: &Config) -> Router {
    let service_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state.db.clone());

    service_routes
        .nest("/api", features::router(state))
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "csvjob server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health(State(db): State<SqlitePool>) -> Result<Json<Value>, AppError> {
    db::health_check(&db).await?;

    Ok(Json(json!({
        "status": "healthy",
        "database": "connected",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
