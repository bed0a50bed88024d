//! klas-cr library interface
//!
//! Content Readiness service for the KLAS platform: classifies every
//! grade/subject cell against tiered coverage thresholds and backfills
//! below-baseline modules idempotently. Exposed as a library for the HTTP
//! service, the gap-fill batch binary, and integration tests.

pub mod api;
pub mod cache;
pub mod db;
pub mod error;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::cache::SnapshotCache;
use crate::services::CoverageReporter;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (read-only)
    pub db: SqlitePool,
    /// Coverage reporting service with its snapshot cache
    pub reporter: Arc<CoverageReporter>,
}

impl AppState {
    /// Create application state with a system-clock snapshot cache
    pub fn new(db: SqlitePool) -> Self {
        let reporter = CoverageReporter::new(db.clone(), SnapshotCache::system());
        Self {
            db,
            reporter: Arc::new(reporter),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/api/coverage", get(api::get_coverage))
        .route("/api/coverage/summary", get(api::get_summary))
        .route("/api/coverage/:grade/:subject", get(api::get_cell))
        .route("/api/coverage/:grade/:subject/ready", get(api::get_ready))
        .route("/api/modules/filter", post(api::filter_modules))
        .merge(api::health_routes())
        .with_state(state)
}
