//! Upload Routes
//!
//! - GET /api/uploads/:id - Get an upload
//! - GET /api/uploads/:id/file - Download the scan

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::dto::UploadResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::storage::{StorageError, Upload};

/// GET /api/uploads/:id
pub async fn get_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<UploadResponse>> {
    find_upload(&state, &id).await.map(|u| Json(u.into()))
}

/// GET /api/uploads/:id/file
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let upload = find_upload(&state, &id).await?;

    let data = state
        .files
        .read_bytes(&upload.file_path)
        .await
        .map_err(|e| match e {
            StorageError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                ApiError::NotFound("File".to_string())
            }
            other => other.into(),
        })?;

    let file_name = upload.file_name();
    let headers = [
        (header::CONTENT_TYPE, content_type_for(&file_name).to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name.replace('"', "")),
        ),
    ];

    Ok((headers, data).into_response())
}

async fn find_upload(state: &AppState, id: &str) -> ApiResult<Upload> {
    state
        .db
        .get_upload(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Upload".to_string()))
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.PDF"), "application/pdf");
        assert_eq!(content_type_for("scan.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("scan.tif"), "image/tiff");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
