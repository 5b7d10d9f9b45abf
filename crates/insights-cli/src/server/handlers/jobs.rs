//! Processing, status and result handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use insights::{InsightReport, JobStatus, JobSummary};
use serde::{Deserialize, Serialize};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Body for process and cancel requests.
#[derive(Deserialize)]
pub struct FileRequest {
    pub file_id: String,
}

/// `?file_id=` query for status and insights.
#[derive(Deserialize)]
pub struct FileQuery {
    pub file_id: String,
}

/// Response for accepted process/cancel requests.
#[derive(Serialize)]
pub struct AcceptedResponse {
    pub file_id: String,
    pub status: JobStatus,
    pub message: String,
}

/// POST /api/v1/process
///
/// Returns 202 as soon as the job is `processing`.
pub async fn process(
    State(state): State<AppState>,
    Json(req): Json<FileRequest>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    let summary = state.orchestrator.submit_processing(&req.file_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            file_id: summary.file_id,
            status: summary.status,
            message: "Processing started".to_string(),
        }),
    ))
}

/// POST /api/v1/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Json(req): Json<FileRequest>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    state.orchestrator.cancel(&req.file_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            file_id: req.file_id,
            status: JobStatus::Processing,
            message: "Cancellation requested".to_string(),
        }),
    ))
}

/// GET /api/v1/status?file_id=
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Result<Json<JobSummary>, ApiError> {
    Ok(Json(state.orchestrator.get_status(&query.file_id).await?))
}

/// GET /api/v1/insights?file_id=
pub async fn insights(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Result<Json<InsightReport>, ApiError> {
    Ok(Json(state.orchestrator.get_insights(&query.file_id).await?))
}
