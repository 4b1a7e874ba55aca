//! Validation result records

use crate::storage::FieldResult;
use serde::{Deserialize, Serialize};

/// Outcome of validating one upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationUploadResult {
    pub upload_id: String,
    pub results: Vec<FieldResult>,
    pub overall_accuracy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_processing_time: Option<f64>,
}

impl ValidationUploadResult {
    /// A result carrying only an error
    pub fn failed(upload_id: &str, error: impl Into<String>) -> Self {
        Self {
            upload_id: upload_id.to_string(),
            results: Vec::new(),
            overall_accuracy: 0.0,
            error: Some(error.into()),
            ocr_processing_time: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a validation job over all uploads of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationDocumentResult {
    pub document_id: String,
    pub upload_results: Vec<ValidationUploadResult>,
    pub total_uploads: u32,
    pub successful_uploads: u32,
    pub failed_uploads: u32,
}

impl ValidationDocumentResult {
    pub fn new(document_id: &str, upload_results: Vec<ValidationUploadResult>) -> Self {
        let successful = upload_results.iter().filter(|r| r.is_success()).count() as u32;
        let total = upload_results.len() as u32;

        Self {
            document_id: document_id.to_string(),
            upload_results,
            total_uploads: total,
            successful_uploads: successful,
            failed_uploads: total - successful,
        }
    }
}

/// Render per-field results as CSV with a header row
pub fn results_to_csv(results: &[FieldResult]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["field_name", "user_value", "ocr_value", "accuracy"])?;

    for result in results {
        writer.write_record([
            result.field_name.as_str(),
            result.user_value.as_str(),
            result.ocr_value.as_str(),
            &format!("{:.4}", result.accuracy),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, accuracy: f64) -> FieldResult {
        FieldResult {
            field_name: name.to_string(),
            user_value: "Jane, Doe".to_string(),
            ocr_value: "Jane Doe".to_string(),
            accuracy,
        }
    }

    #[test]
    fn test_document_result_counts() {
        let ok = ValidationUploadResult {
            upload_id: "u1".to_string(),
            results: vec![field("name", 0.9)],
            overall_accuracy: 0.9,
            error: None,
            ocr_processing_time: Some(1.5),
        };
        let bad = ValidationUploadResult::failed("u2", "Upload has no user input JSON");

        let doc = ValidationDocumentResult::new("d1", vec![ok, bad]);
        assert_eq!(doc.total_uploads, 2);
        assert_eq!(doc.successful_uploads, 1);
        assert_eq!(doc.failed_uploads, 1);
    }

    #[test]
    fn test_failed_result_serialization() {
        let bad = ValidationUploadResult::failed("u2", "boom");
        let json = serde_json::to_value(&bad).unwrap();
        assert_eq!(json["error"], "boom");
        assert_eq!(json["overall_accuracy"], 0.0);
        assert!(json.get("ocr_processing_time").is_none());
    }

    #[test]
    fn test_results_to_csv() {
        let csv = results_to_csv(&[field("name", 0.875)]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("field_name,user_value,ocr_value,accuracy")
        );
        assert_eq!(lines.next(), Some("name,\"Jane, Doe\",Jane Doe,0.8750"));
        assert_eq!(lines.next(), None);
    }
}
