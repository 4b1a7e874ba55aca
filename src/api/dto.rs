//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! Stored records (projects, documents, jobs, log entries) are returned as-is.

use serde::{Deserialize, Serialize};

use crate::storage::Upload;
use crate::validation::ValidationDocumentResult;

// ============================================
// PROJECT DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
}

// ============================================
// DOCUMENT DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub project_id: String,
    pub name: String,
    /// OCR endpoint, or `mock`
    #[serde(default)]
    pub ocr_url: Option<String>,
}

/// Partial document update; absent fields are left unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ocr_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentListQuery {
    #[serde(default)]
    pub project_id: Option<String>,
}

// ============================================
// UPLOAD DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct UploadListQuery {
    /// Also list uploads that have no user input yet
    #[serde(default)]
    pub include_pending: bool,
}

/// Upload with its original file name
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub upload: Upload,
    pub file_name: String,
}

impl From<Upload> for UploadResponse {
    fn from(upload: Upload) -> Self {
        let file_name = upload.file_name();
        Self { upload, file_name }
    }
}

// ============================================
// VALIDATION DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct RunValidationRequest {
    pub document_id: String,
}

/// Job outcome; `result` is only present once the job completed
#[derive(Debug, Serialize, Deserialize)]
pub struct JobResultResponse {
    pub job_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ValidationDocumentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    /// `json` (default) or `csv`
    #[serde(default)]
    pub format: Option<String>,
}

// ============================================
// LOG DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default = "default_log_limit")]
    pub limit: usize,
}

fn default_log_limit() -> usize {
    100
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    pub status: String,
    /// "ok" or "error"
    pub database: String,
    pub uptime_seconds: u64,
    pub version: String,
}
