//! Project Routes
//!
//! - POST /api/projects - Create a project
//! - GET /api/projects - List projects, newest first
//! - GET /api/projects/:id - Get a project
//! - PATCH /api/projects/:id - Rename a project

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CreateProjectRequest, UpdateProjectRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::storage::Project;

/// POST /api/projects
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let name = required_name(&req.name)?;
    let project = state.db.create_project(name).await?;

    tracing::info!(project_id = %project.id, name = %project.name, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects
pub async fn list_projects(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.db.list_projects().await?))
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    state
        .db
        .get_project(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Project".to_string()))
}

/// PATCH /api/projects/:id
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let name = req.name.as_deref().map(required_name).transpose()?;

    state
        .db
        .update_project(&id, name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Project".to_string()))
}

/// Trimmed, non-empty name
pub(crate) fn required_name(name: &str) -> ApiResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Name cannot be empty".to_string()));
    }
    Ok(name)
}
