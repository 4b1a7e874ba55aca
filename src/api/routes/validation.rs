//! Validation Routes
//!
//! - POST /api/validation/run - Start a validation job for a document
//! - GET /api/validation/status/:job_id - Job status and progress
//! - GET /api/validation/result/:job_id - Job outcome
//! - GET /api/validation/upload/:upload_id/results - Latest per-field results

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{JobResultResponse, ResultsQuery, RunValidationRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::state::AppState;
use crate::storage::{JobStatus, ValidationJob};
use crate::validation::{results_to_csv, ValidationDocumentResult};

/// POST /api/validation/run
///
/// Answers 202 with the pending job; the work continues in the background.
pub async fn run_validation(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RunValidationRequest>,
) -> ApiResult<(StatusCode, Json<ValidationJob>)> {
    let job = state.jobs.start(&req.document_id).await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// GET /api/validation/status/:job_id
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<ValidationJob>> {
    find_job(&state, &job_id).await.map(Json)
}

/// GET /api/validation/result/:job_id
pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobResultResponse>> {
    let job = find_job(&state, &job_id).await?;

    let result = match (job.status, job.result) {
        (JobStatus::Completed, Some(value)) => Some(
            serde_json::from_value::<ValidationDocumentResult>(value)
                .map_err(|e| ApiError::Internal(format!("Corrupt job result: {}", e)))?,
        ),
        _ => None,
    };

    Ok(Json(JobResultResponse {
        job_id: job.id,
        status: job.status.to_string(),
        result,
        error: job.error,
    }))
}

/// GET /api/validation/upload/:upload_id/results?format=json|csv
pub async fn get_upload_results(
    State(state): State<Arc<AppState>>,
    Path(upload_id): Path<String>,
    ApiQuery(query): ApiQuery<ResultsQuery>,
) -> ApiResult<Response> {
    let results = state.db.latest_validation_results(&upload_id).await?;

    match query.format.as_deref().unwrap_or("json") {
        "json" => Ok(Json(results).into_response()),
        "csv" => {
            let body = results_to_csv(&results)
                .map_err(|e| ApiError::Internal(format!("CSV export failed: {}", e)))?;
            Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response())
        }
        other => Err(ApiError::Validation(format!(
            "Unsupported format '{}', expected json or csv",
            other
        ))),
    }
}

async fn find_job(state: &AppState, job_id: &str) -> ApiResult<ValidationJob> {
    state
        .db
        .get_job(job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Job".to_string()))
}
