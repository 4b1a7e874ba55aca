//! Core data types for docval
//!
//! Records persisted in SQLite: projects, documents, uploads, validation
//! results, validation jobs and the event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A group of documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A document type (form) whose scans are validated against OCR output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub project_id: String,
    pub name: String,
    /// OCR endpoint; the literal `mock` replays the sample JSON
    pub ocr_url: Option<String>,
    /// Storage identifier of the sample OCR response
    pub sample_json_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Whether OCR calls should be answered from the sample JSON
    pub fn uses_mock_ocr(&self) -> bool {
        self.ocr_url
            .as_deref()
            .map(|url| url.trim().eq_ignore_ascii_case("mock"))
            .unwrap_or(false)
    }
}

/// A scanned file uploaded for a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    pub id: String,
    pub document_id: String,
    /// Storage identifier of the scan
    pub file_path: String,
    /// Storage identifier of the user-entered values
    pub user_input_json_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Upload {
    /// Original file name of the scan, without the storage prefix
    pub fn file_name(&self) -> String {
        let base = std::path::Path::new(&self.file_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.file_path.clone());

        let prefix = format!("doc_{}_", self.document_id);
        base.strip_prefix(&prefix).map(str::to_string).unwrap_or(base)
    }
}

/// Score of one field: user value against OCR value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResult {
    pub field_name: String,
    pub user_value: String,
    pub ocr_value: String,
    /// Similarity in [0, 1]
    pub accuracy: f64,
}

/// Lifecycle state of a validation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Completed or failed
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A background validation run over all uploads of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationJob {
    pub id: String,
    pub document_id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    /// Serialized `ValidationDocumentResult` once completed
    pub result: Option<serde_json::Value>,
    pub total_uploads: Option<u32>,
    pub processed_uploads: Option<u32>,
}

/// Partial update of a validation job
///
/// `None` fields are left untouched.
#[derive(Debug, Clone)]
pub struct JobUpdate {
    pub status: JobStatus,
    pub error: Option<String>,
    pub result: Option<serde_json::Value>,
    pub total_uploads: Option<u32>,
    pub processed_uploads: Option<u32>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status,
            error: None,
            result: None,
            total_uploads: None,
            processed_uploads: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::status(JobStatus::Failed).error(error)
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn total_uploads(mut self, total: u32) -> Self {
        self.total_uploads = Some(total);
        self
    }

    pub fn processed_uploads(mut self, processed: u32) -> Self {
        self.processed_uploads = Some(processed);
        self
    }
}

/// Severity of an event log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INFO" => Some(LogLevel::Info),
            "WARN" | "WARNING" => Some(LogLevel::Warn),
            "ERROR" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Persisted application event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub level: LogLevel,
    pub message: String,
    pub context: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(ocr_url: Option<&str>) -> Document {
        Document {
            id: "d1".to_string(),
            project_id: "p1".to_string(),
            name: "invoice".to_string(),
            ocr_url: ocr_url.map(str::to_string),
            sample_json_path: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_mock_detection() {
        assert!(document(Some("mock")).uses_mock_ocr());
        assert!(document(Some("MOCK")).uses_mock_ocr());
        assert!(!document(Some("http://ocr.local/run")).uses_mock_ocr());
        assert!(!document(None).uses_mock_ocr());
    }

    #[test]
    fn test_upload_file_name_strips_prefix() {
        let upload = Upload {
            id: "u1".to_string(),
            document_id: "d1".to_string(),
            file_path: "/data/19-10-2026/uploads/doc_d1_scan.png".to_string(),
            user_input_json_path: None,
            created_at: Utc::now(),
        };
        assert_eq!(upload.file_name(), "scan.png");
    }

    #[test]
    fn test_job_status_strings() {
        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert_eq!(
            serde_json::to_string(&JobStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("error"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("debug"), None);
    }
}
