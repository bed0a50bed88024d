//! Coverage reporting endpoints
//!
//! The reporting surface never 500s on store trouble: the reporter
//! degrades to its last good snapshot internally, so these handlers always
//! have something to serve.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::types::{CoverageSummary, DegradeMode, GradeSubjectCoverage};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CoverageQuery {
    /// Bypass the snapshot cache
    #[serde(default)]
    pub refresh: bool,
}

/// GET /api/coverage
pub async fn get_coverage(
    State(state): State<AppState>,
    Query(query): Query<CoverageQuery>,
) -> Json<Vec<GradeSubjectCoverage>> {
    Json(state.reporter.get_content_coverage(query.refresh).await)
}

/// GET /api/coverage/summary
pub async fn get_summary(State(state): State<AppState>) -> Json<CoverageSummary> {
    Json(state.reporter.get_coverage_summary().await)
}

/// GET /api/coverage/:grade/:subject
pub async fn get_cell(
    State(state): State<AppState>,
    Path((grade, subject)): Path<(String, String)>,
) -> ApiResult<Json<GradeSubjectCoverage>> {
    state
        .reporter
        .get_content_coverage(false)
        .await
        .into_iter()
        .find(|cell| cell.grade == grade && cell.subject == subject)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no coverage cell for {grade}/{subject}")))
}

#[derive(Debug, Deserialize)]
pub struct ReadyQuery {
    #[serde(default)]
    pub allow_beta: bool,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub grade: String,
    pub subject: String,
    pub allow_beta: bool,
    pub ready: bool,
}

/// GET /api/coverage/:grade/:subject/ready
pub async fn get_ready(
    State(state): State<AppState>,
    Path((grade, subject)): Path<(String, String)>,
    Query(query): Query<ReadyQuery>,
) -> Json<ReadyResponse> {
    let ready = state
        .reporter
        .is_grade_subject_ready(&grade, &subject, query.allow_beta)
        .await;
    Json(ReadyResponse {
        grade,
        subject,
        allow_beta: query.allow_beta,
        ready,
    })
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub module_ids: Vec<i64>,
    #[serde(default)]
    pub allow_beta: bool,
}

#[derive(Debug, Serialize)]
pub struct FilterResponse {
    pub module_ids: Vec<i64>,
}

/// POST /api/modules/filter
///
/// Filtering gates recommendation surfacing, so a failed lookup passes the
/// candidate set through rather than hiding content.
pub async fn filter_modules(
    State(state): State<AppState>,
    Json(request): Json<FilterRequest>,
) -> Json<FilterResponse> {
    let module_ids = state
        .reporter
        .filter_modules_by_readiness(
            &request.module_ids,
            request.allow_beta,
            DegradeMode::PassThrough,
        )
        .await;
    Json(FilterResponse { module_ids })
}
