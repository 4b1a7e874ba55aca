//! HTTP API Client
//!
//! Functions for communicating with the docval REST API.

use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";

const API_URL_KEY: &str = "docval_api_url";

/// Get the API base URL from local storage or use default
pub fn get_api_base() -> String {
    let url = web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .and_then(|storage| storage.get_item(API_URL_KEY).ok().flatten())
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    url.trim_end_matches('/').to_string()
}

/// Set the API base URL in local storage
pub fn set_api_base(url: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            let _ = storage.set_item(API_URL_KEY, url.trim());
        }
    }
}

// ============ Response Types ============

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Document {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub ocr_url: Option<String>,
    #[serde(default)]
    pub sample_json_path: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Upload {
    pub id: String,
    pub document_id: String,
    pub file_name: String,
    #[serde(default)]
    pub user_input_json_path: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ValidationJob {
    pub id: String,
    pub document_id: String,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub total_uploads: Option<u32>,
    #[serde(default)]
    pub processed_uploads: Option<u32>,
}

impl ValidationJob {
    pub fn is_finished(&self) -> bool {
        self.status == "completed" || self.status == "failed"
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct FieldResult {
    pub field_name: String,
    pub user_value: String,
    pub ocr_value: String,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct UploadResult {
    pub upload_id: String,
    pub results: Vec<FieldResult>,
    pub overall_accuracy: f64,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ocr_processing_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct DocumentResult {
    pub document_id: String,
    pub upload_results: Vec<UploadResult>,
    pub total_uploads: u32,
    pub successful_uploads: u32,
    pub failed_uploads: u32,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct JobResult {
    pub job_id: String,
    pub status: String,
    #[serde(default)]
    pub result: Option<DocumentResult>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorDetail {
    message: String,
}

// ============ Helpers ============

async fn send(request: Result<Request, gloo_net::Error>) -> Result<Response, String> {
    let response = request
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("Request failed with status {}", status),
        };
        return Err(message);
    }

    Ok(response)
}

async fn get_json<T: DeserializeOwned>(path: &str) -> Result<T, String> {
    let url = format!("{}{}", get_api_base(), path);
    let response = send(Request::get(&url).build()).await?;
    response.json().await.map_err(|e| format!("Parse error: {}", e))
}

async fn send_json<B: serde::Serialize, T: DeserializeOwned>(
    method: &str,
    path: &str,
    body: &B,
) -> Result<T, String> {
    let url = format!("{}{}", get_api_base(), path);
    let builder = match method {
        "PATCH" => Request::patch(&url),
        _ => Request::post(&url),
    };
    let response = send(builder.json(body)).await?;
    response.json().await.map_err(|e| format!("Parse error: {}", e))
}

/// POST a single file as a multipart form field
async fn post_file<T: DeserializeOwned>(
    path: &str,
    field: &str,
    file: &web_sys::File,
) -> Result<T, String> {
    let form = web_sys::FormData::new().map_err(|_| "Could not create form data".to_string())?;
    form.append_with_blob_and_filename(field, file, &file.name())
        .map_err(|_| "Could not attach file".to_string())?;

    let url = format!("{}{}", get_api_base(), path);
    let response = send(Request::post(&url).body(form)).await?;
    response.json().await.map_err(|e| format!("Parse error: {}", e))
}

// ============ Projects ============

pub async fn fetch_projects() -> Result<Vec<Project>, String> {
    get_json("/projects").await
}

pub async fn fetch_project(id: &str) -> Result<Project, String> {
    get_json(&format!("/projects/{}", id)).await
}

pub async fn create_project(name: &str) -> Result<Project, String> {
    send_json("POST", "/projects", &serde_json::json!({ "name": name })).await
}

// ============ Documents ============

pub async fn fetch_documents(project_id: &str) -> Result<Vec<Document>, String> {
    get_json(&format!("/documents?project_id={}", encode(project_id))).await
}

pub async fn fetch_document(id: &str) -> Result<Document, String> {
    get_json(&format!("/documents/{}", id)).await
}

/// Create a document; an empty OCR URL is sent as absent
pub async fn create_document(project_id: &str, name: &str, ocr_url: &str) -> Result<Document, String> {
    let ocr_url = Some(ocr_url.trim()).filter(|url| !url.is_empty());
    send_json(
        "POST",
        "/documents",
        &serde_json::json!({ "project_id": project_id, "name": name, "ocr_url": ocr_url }),
    )
    .await
}

pub async fn update_ocr_url(document_id: &str, ocr_url: &str) -> Result<Document, String> {
    send_json(
        "PATCH",
        &format!("/documents/{}", document_id),
        &serde_json::json!({ "ocr_url": ocr_url.trim() }),
    )
    .await
}

pub async fn upload_sample_json(document_id: &str, file: &web_sys::File) -> Result<Document, String> {
    post_file(&format!("/documents/{}/sample-json", document_id), "sample", file).await
}

pub async fn fetch_text_fields(document_id: &str) -> Result<Vec<String>, String> {
    get_json(&format!("/documents/{}/text-fields", document_id)).await
}

// ============ Uploads ============

pub async fn upload_scan(document_id: &str, file: &web_sys::File) -> Result<Upload, String> {
    post_file(&format!("/documents/{}/upload", document_id), "file", file).await
}

/// All uploads of a document, including those still waiting for user input
pub async fn fetch_uploads(document_id: &str) -> Result<Vec<Upload>, String> {
    get_json(&format!("/documents/{}/uploads?include_pending=true", document_id)).await
}

pub async fn fetch_upload(id: &str) -> Result<Upload, String> {
    get_json(&format!("/uploads/{}", id)).await
}

pub async fn upload_user_input(upload_id: &str, file: &web_sys::File) -> Result<Upload, String> {
    post_file(&format!("/documents/{}/user-input", upload_id), "form_json", file).await
}

pub fn upload_file_url(upload_id: &str) -> String {
    format!("{}/uploads/{}/file", get_api_base(), upload_id)
}

// ============ Validation ============

pub async fn run_validation(document_id: &str) -> Result<ValidationJob, String> {
    send_json(
        "POST",
        "/validation/run",
        &serde_json::json!({ "document_id": document_id }),
    )
    .await
}

pub async fn fetch_job_status(job_id: &str) -> Result<ValidationJob, String> {
    get_json(&format!("/validation/status/{}", job_id)).await
}

pub async fn fetch_job_result(job_id: &str) -> Result<JobResult, String> {
    get_json(&format!("/validation/result/{}", job_id)).await
}

pub async fn fetch_upload_results(upload_id: &str) -> Result<Vec<FieldResult>, String> {
    get_json(&format!("/validation/upload/{}/results", upload_id)).await
}

pub fn upload_results_csv_url(upload_id: &str) -> String {
    format!(
        "{}/validation/upload/{}/results?format=csv",
        get_api_base(),
        upload_id
    )
}

fn encode(value: &str) -> String {
    String::from(js_sys::encode_uri_component(value))
}
