//! Document Routes
//!
//! - POST /api/documents - Create a document in a project
//! - GET /api/documents?project_id= - List documents
//! - GET /api/documents/:id - Get a document
//! - PATCH /api/documents/:id - Update name and/or OCR URL
//! - POST /api/documents/:id/sample-json - Attach the sample OCR response
//! - GET /api/documents/:id/text-fields - Text field names of the sample
//! - POST /api/documents/:id/upload - Upload a scan
//! - POST /api/documents/:id/user-input - Attach user values (`:id` is an upload id)
//! - GET /api/documents/:id/uploads - List uploads of a document

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::projects::required_name;
use super::{is_json_file, parse_json, read_file_field};
use crate::api::dto::{
    CreateDocumentRequest, DocumentListQuery, UpdateDocumentRequest, UploadListQuery,
    UploadResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{ApiJson, ApiMultipart, ApiQuery};
use crate::api::state::AppState;
use crate::ocr::extract_text_fields;
use crate::storage::files::{sanitize_file_name, SAMPLES, UPLOADS, USER_INPUTS};
use crate::storage::{Document, FileStore};

/// Accepted scan extensions
const SCAN_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tif", "tiff"];

/// POST /api/documents
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateDocumentRequest>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let name = required_name(&req.name)?;

    if state.db.get_project(&req.project_id).await?.is_none() {
        return Err(ApiError::NotFound("Project".to_string()));
    }

    let ocr_url = req.ocr_url.as_deref().map(str::trim).filter(|u| !u.is_empty());
    let document = state.db.create_document(&req.project_id, name, ocr_url).await?;

    tracing::info!(
        document_id = %document.id,
        project_id = %document.project_id,
        mock_ocr = document.uses_mock_ocr(),
        "Document created"
    );
    Ok((StatusCode::CREATED, Json(document)))
}

/// GET /api/documents
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<DocumentListQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let documents = state.db.list_documents(query.project_id.as_deref()).await?;
    Ok(Json(documents))
}

/// GET /api/documents/:id
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Document>> {
    find_document(&state, &id).await.map(Json)
}

/// PATCH /api/documents/:id
pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateDocumentRequest>,
) -> ApiResult<Json<Document>> {
    let name = req.name.as_deref().map(required_name).transpose()?;
    let ocr_url = req.ocr_url.as_deref().map(str::trim);

    state
        .db
        .update_document(&id, name, ocr_url)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Document".to_string()))
}

/// POST /api/documents/:id/sample-json
///
/// Multipart field `sample`, a `.json` file holding an example OCR response.
pub async fn upload_sample_json(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiMultipart(multipart): ApiMultipart,
) -> ApiResult<Json<Document>> {
    let sample = read_file_field(multipart, "sample").await?;
    if !is_json_file(&sample.file_name) {
        return Err(ApiError::Validation("Sample must be a JSON file".to_string()));
    }

    let document = find_document(&state, &id).await?;
    parse_json(&sample.data)?;

    let key = FileStore::make_key(SAMPLES, &format!("doc_{}_sample.json", document.id));
    let path = state.files.save_bytes(&key, &sample.data).await?;

    let document = state
        .db
        .set_document_sample_path(&document.id, &path)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document".to_string()))?;

    tracing::info!(document_id = %document.id, bytes = sample.data.len(), "Sample JSON stored");
    Ok(Json(document))
}

/// GET /api/documents/:id/text-fields
pub async fn get_text_fields(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    let document = find_document(&state, &id).await?;
    let sample_path = document.sample_json_path.as_deref().ok_or_else(|| {
        ApiError::Validation("Sample JSON not uploaded for document".to_string())
    })?;

    let sample: serde_json::Value = state
        .files
        .read_bytes(sample_path)
        .await
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or_else(|| ApiError::Validation("Invalid sample JSON content".to_string()))?;

    Ok(Json(extract_text_fields(&sample).into_keys().collect()))
}

/// POST /api/documents/:id/upload
///
/// Multipart field `file`: a PDF, PNG, JPEG or TIFF scan.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiMultipart(multipart): ApiMultipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let document = find_document(&state, &id).await?;
    let file = read_file_field(multipart, "file").await?;

    if !has_scan_extension(&file.file_name) {
        return Err(ApiError::Validation("Unsupported file type".to_string()));
    }

    let file_name = sanitize_file_name(&file.file_name);
    let key = FileStore::make_key(UPLOADS, &format!("doc_{}_{}", document.id, file_name));
    let path = state.files.save_bytes(&key, &file.data).await?;
    let upload = state.db.create_upload(&document.id, &path).await?;

    tracing::info!(
        upload_id = %upload.id,
        document_id = %document.id,
        file = %file_name,
        bytes = file.data.len(),
        "Scan uploaded"
    );
    Ok((StatusCode::CREATED, Json(upload.into())))
}

/// POST /api/documents/:id/user-input
///
/// `:id` is the upload id. Multipart field `form_json`, a `.json` file with
/// the values the user read from the scan.
pub async fn upload_user_input(
    State(state): State<Arc<AppState>>,
    Path(upload_id): Path<String>,
    ApiMultipart(multipart): ApiMultipart,
) -> ApiResult<Json<UploadResponse>> {
    let form = read_file_field(multipart, "form_json").await?;
    if !is_json_file(&form.file_name) {
        return Err(ApiError::Validation("User input must be a JSON file".to_string()));
    }
    parse_json(&form.data)?;

    if state.db.get_upload(&upload_id).await?.is_none() {
        return Err(ApiError::NotFound("Upload".to_string()));
    }

    let key = FileStore::make_key(USER_INPUTS, &format!("upload_{}_user.json", upload_id));
    let path = state.files.save_bytes(&key, &form.data).await?;

    let upload = state
        .db
        .set_upload_user_input(&upload_id, &path)
        .await?
        .ok_or_else(|| ApiError::NotFound("Upload".to_string()))?;

    tracing::info!(upload_id = %upload.id, "User input stored");
    Ok(Json(upload.into()))
}

/// GET /api/documents/:id/uploads
///
/// Only uploads with user input unless `include_pending=true`.
pub async fn list_uploads(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<UploadListQuery>,
) -> ApiResult<Json<Vec<UploadResponse>>> {
    let uploads = state.db.list_uploads(&id, !query.include_pending).await?;
    Ok(Json(uploads.into_iter().map(UploadResponse::from).collect()))
}

async fn find_document(state: &AppState, id: &str) -> ApiResult<Document> {
    state
        .db
        .get_document(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document".to_string()))
}

fn has_scan_extension(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SCAN_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_extensions() {
        assert!(has_scan_extension("scan.PDF"));
        assert!(has_scan_extension("page-1.tiff"));
        assert!(!has_scan_extension("notes.txt"));
        assert!(!has_scan_extension("png"));
    }
}
