//! Log Routes
//!
//! - GET /api/logs?limit= - Recent application events, newest first

use axum::{
    extract::State,
    Json,
};
use std::sync::Arc;

use crate::api::dto::LogsQuery;
use crate::api::error::ApiResult;
use crate::api::extract::ApiQuery;
use crate::api::state::AppState;
use crate::storage::LogEntry;

/// GET /api/logs
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<LogsQuery>,
) -> ApiResult<Json<Vec<LogEntry>>> {
    Ok(Json(state.db.list_logs(query.limit).await?))
}
