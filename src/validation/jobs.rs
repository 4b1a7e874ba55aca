//! Validation Job Runner
//!
//! Runs validation of every upload of a document as a background tokio task.
//! Progress and the final result are written to the job record, so callers
//! poll the job instead of waiting on the request.

use crate::ocr::{compare_fields, extract_text_fields, OcrEngine, OcrError};
use crate::storage::{
    Database, Document, FieldResult, FileStore, JobStatus, JobUpdate, LogLevel, StorageError,
    Upload, ValidationJob,
};
use crate::validation::results::{ValidationDocumentResult, ValidationUploadResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

const NO_UPLOADS: &str = "No uploads with user input found for this document";

/// Errors returned when a job cannot be started or run
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a single upload could not be validated
enum UploadFailure {
    /// Missing or malformed inputs
    Input(String),
    Ocr(OcrError),
    Internal(String),
}

impl From<StorageError> for UploadFailure {
    fn from(e: StorageError) -> Self {
        UploadFailure::Internal(e.to_string())
    }
}

/// Starts and executes validation jobs
pub struct JobRunner {
    db: Arc<Database>,
    files: Arc<FileStore>,
    ocr: Arc<dyn OcrEngine>,
}

impl JobRunner {
    pub fn new(db: Arc<Database>, files: Arc<FileStore>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { db, files, ocr }
    }

    /// Create a pending job for `document_id` and run it in the background
    pub async fn start(self: &Arc<Self>, document_id: &str) -> Result<ValidationJob, ValidationError> {
        let document = self
            .db
            .get_document(document_id)
            .await?
            .ok_or_else(|| ValidationError::NotFound("Document".to_string()))?;

        if self.db.list_uploads(&document.id, true).await?.is_empty() {
            return Err(ValidationError::Invalid(NO_UPLOADS.to_string()));
        }

        let job = self.db.create_job(&document.id).await?;
        tracing::info!(job_id = %job.id, document_id = %document.id, "Validation job queued");

        let runner = Arc::clone(self);
        let job_id = job.id.clone();
        let document_id = document.id.clone();
        tokio::spawn(async move {
            runner.run(&job_id, &document_id).await;
        });

        Ok(job)
    }

    /// Execute a job to completion, recording any failure on the job
    pub async fn run(&self, job_id: &str, document_id: &str) {
        if let Err(e) = self.execute(job_id, document_id).await {
            tracing::error!(job_id = %job_id, error = %e, "Validation job failed");

            let message = format!("Validation job {} failed", job_id);
            if let Err(log_err) = self
                .db
                .log_event(LogLevel::Error, &message, Some(&e.to_string()))
                .await
            {
                tracing::warn!(error = %log_err, "Failed to record log event");
            }
            if let Err(update_err) = self.db.update_job(job_id, JobUpdate::failed(e.to_string())).await {
                tracing::error!(job_id = %job_id, error = %update_err, "Failed to mark job as failed");
            }
        }
    }

    async fn execute(&self, job_id: &str, document_id: &str) -> Result<(), ValidationError> {
        self.db
            .update_job(job_id, JobUpdate::status(JobStatus::Running))
            .await?;

        let Some(document) = self.db.get_document(document_id).await? else {
            self.db
                .update_job(job_id, JobUpdate::failed("Document not found"))
                .await?;
            return Ok(());
        };

        let uploads = self.db.list_uploads(&document.id, true).await?;
        if uploads.is_empty() {
            self.db.update_job(job_id, JobUpdate::failed(NO_UPLOADS)).await?;
            return Ok(());
        }

        let total = uploads.len() as u32;
        self.db
            .update_job(
                job_id,
                JobUpdate::status(JobStatus::Running)
                    .total_uploads(total)
                    .processed_uploads(0),
            )
            .await?;

        let mut upload_results = Vec::with_capacity(uploads.len());
        for (idx, upload) in uploads.iter().enumerate() {
            upload_results.push(self.validate_upload(&document, upload).await);
            self.db
                .update_job(
                    job_id,
                    JobUpdate::status(JobStatus::Running).processed_uploads(idx as u32 + 1),
                )
                .await?;
        }

        let result = ValidationDocumentResult::new(&document.id, upload_results);
        let (successful, failed) = (result.successful_uploads, result.failed_uploads);

        self.db
            .update_job(
                job_id,
                JobUpdate::status(JobStatus::Completed)
                    .result(serde_json::to_value(&result)?)
                    .processed_uploads(total),
            )
            .await?;

        let message = format!(
            "Validation job {} completed: {} successful, {} failed",
            job_id, successful, failed
        );
        self.db.log_event(LogLevel::Info, &message, None).await?;
        tracing::info!(job_id = %job_id, successful, failed, "Validation job completed");

        Ok(())
    }

    /// Validate one upload; failures end up in the result, never as an error
    pub async fn validate_upload(&self, document: &Document, upload: &Upload) -> ValidationUploadResult {
        match self.try_validate_upload(document, upload).await {
            Ok(result) => result,
            Err(UploadFailure::Input(message)) => ValidationUploadResult::failed(&upload.id, message),
            Err(UploadFailure::Ocr(e)) => {
                tracing::warn!(upload_id = %upload.id, error = %e, "OCR request failed");
                self.record_error(&format!("OCR request failed for upload {}", upload.id), &e.to_string())
                    .await;
                ValidationUploadResult::failed(&upload.id, format!("OCR service error: {}", e))
            }
            Err(UploadFailure::Internal(e)) => {
                tracing::error!(upload_id = %upload.id, error = %e, "Upload validation error");
                self.record_error(&format!("Validation error for upload {}", upload.id), &e)
                    .await;
                ValidationUploadResult::failed(&upload.id, format!("Validation error: {}", e))
            }
        }
    }

    async fn try_validate_upload(
        &self,
        document: &Document,
        upload: &Upload,
    ) -> Result<ValidationUploadResult, UploadFailure> {
        let user_path = upload
            .user_input_json_path
            .as_deref()
            .ok_or_else(|| UploadFailure::Input("Upload has no user input JSON".to_string()))?;

        let user_json: Value = serde_json::from_str(&self.files.read_text(user_path).await?)
            .map_err(|e| UploadFailure::Internal(e.to_string()))?;
        let user_fields = stringify_fields(&user_json).ok_or_else(|| {
            UploadFailure::Input("User input JSON format invalid; expected an object".to_string())
        })?;

        let ocr_url = document
            .ocr_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| UploadFailure::Input("Document has no OCR URL configured".to_string()))?;

        let ocr_json = if document.uses_mock_ocr() {
            self.sample_response(document).await?
        } else {
            let data = self.files.read_bytes(&upload.file_path).await?;
            self.ocr
                .recognize(ocr_url, &upload.file_name(), data)
                .await
                .map_err(UploadFailure::Ocr)?
        };

        let ocr_fields = extract_text_fields(&ocr_json);
        let (scores, overall) = compare_fields(&user_fields, &ocr_fields);

        let results: Vec<FieldResult> = user_fields
            .iter()
            .map(|(key, user_value)| FieldResult {
                field_name: key.clone(),
                user_value: user_value.clone(),
                ocr_value: ocr_fields.get(key).cloned().unwrap_or_default(),
                accuracy: scores.get(key).copied().unwrap_or(0.0),
            })
            .collect();

        self.db
            .replace_validation_results(&document.id, &upload.id, &results)
            .await?;

        tracing::debug!(
            upload_id = %upload.id,
            fields = results.len(),
            overall,
            "Upload validated"
        );

        Ok(ValidationUploadResult {
            upload_id: upload.id.clone(),
            results,
            overall_accuracy: overall,
            error: None,
            ocr_processing_time: ocr_json.get("processing_time").and_then(Value::as_f64),
        })
    }

    /// The document's sample JSON, standing in for the OCR response
    async fn sample_response(&self, document: &Document) -> Result<Value, UploadFailure> {
        let path = document
            .sample_json_path
            .as_deref()
            .ok_or_else(|| UploadFailure::Input("Sample JSON not uploaded for document".to_string()))?;

        let text = self
            .files
            .read_text(path)
            .await
            .map_err(|e| UploadFailure::Input(format!("Failed to read sample JSON: {}", e)))?;

        serde_json::from_str(&text)
            .map_err(|e| UploadFailure::Input(format!("Failed to read sample JSON: {}", e)))
    }

    async fn record_error(&self, message: &str, context: &str) {
        if let Err(e) = self.db.log_event(LogLevel::Error, message, Some(context)).await {
            tracing::warn!(error = %e, "Failed to record log event");
        }
    }
}

/// Flatten a user input object into field name -> text
///
/// Strings are kept as-is, everything else becomes its JSON text.
fn stringify_fields(value: &Value) -> Option<BTreeMap<String, String>> {
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    /// Answers every request with the same response
    struct FixedOcr(Value);

    #[async_trait]
    impl OcrEngine for FixedOcr {
        async fn recognize(&self, _: &str, _: &str, _: Vec<u8>) -> Result<Value, OcrError> {
            Ok(self.0.clone())
        }
    }

    struct DownOcr;

    #[async_trait]
    impl OcrEngine for DownOcr {
        async fn recognize(&self, _: &str, _: &str, _: Vec<u8>) -> Result<Value, OcrError> {
            Err(OcrError::Unavailable)
        }
    }

    fn ocr_response() -> Value {
        json!({
            "information": [{
                "name": {"type": "text", "value": "Jane Doe"},
                "total": {"type": "text", "value": 120},
                "photo": {"type": "image", "value": "..."}
            }],
            "processing_time": 0.75
        })
    }

    struct Fixture {
        _dir: TempDir,
        db: Arc<Database>,
        files: Arc<FileStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let files = Arc::new(FileStore::new(dir.path().join("files")).unwrap());
            Self {
                _dir: dir,
                db: Arc::new(Database::open_in_memory().unwrap()),
                files,
            }
        }

        fn runner(&self, ocr: Arc<dyn OcrEngine>) -> Arc<JobRunner> {
            Arc::new(JobRunner::new(self.db.clone(), self.files.clone(), ocr))
        }

        async fn document(&self, ocr_url: Option<&str>) -> Document {
            let project = self.db.create_project(&uuid::Uuid::new_v4().to_string()).await.unwrap();
            self.db
                .create_document(&project.id, "invoice", ocr_url)
                .await
                .unwrap()
        }

        async fn upload(&self, document: &Document, user_input: Option<Value>) -> Upload {
            let key = FileStore::make_key("uploads", &format!("doc_{}_scan.png", document.id));
            let path = self.files.save_bytes(&key, b"fake scan").await.unwrap();
            let upload = self.db.create_upload(&document.id, &path).await.unwrap();

            match user_input {
                Some(input) => {
                    let key = FileStore::make_key("user_inputs", &format!("upload_{}_user.json", upload.id));
                    let path = self.files.save_text(&key, &input.to_string()).await.unwrap();
                    self.db
                        .set_upload_user_input(&upload.id, &path)
                        .await
                        .unwrap()
                        .unwrap()
                }
                None => upload,
            }
        }

        async fn wait_for(&self, job_id: &str) -> ValidationJob {
            for _ in 0..200 {
                let job = self.db.get_job(job_id).await.unwrap().unwrap();
                if job.status.is_terminal() {
                    return job;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            panic!("job {} did not finish", job_id);
        }
    }

    #[tokio::test]
    async fn test_job_completes_with_results() {
        let fx = Fixture::new();
        let runner = fx.runner(Arc::new(FixedOcr(ocr_response())));
        let document = fx.document(Some("http://ocr.local/run")).await;
        let upload = fx
            .upload(&document, Some(json!({"name": "Jane Doe", "total": 120, "city": "Oslo"})))
            .await;

        let job = runner.start(&document.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        let job = fx.wait_for(&job.id).await;
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.total_uploads, Some(1));
        assert_eq!(job.processed_uploads, Some(1));
        assert!(job.started_at.is_some());
        assert!(job.completed_at.is_some());

        let result: ValidationDocumentResult = serde_json::from_value(job.result.unwrap()).unwrap();
        assert_eq!(result.successful_uploads, 1);
        assert_eq!(result.failed_uploads, 0);

        let upload_result = &result.upload_results[0];
        assert_eq!(upload_result.upload_id, upload.id);
        assert_eq!(upload_result.ocr_processing_time, Some(0.75));
        // name and total match, city is missing from OCR
        assert!((upload_result.overall_accuracy - 2.0 / 3.0).abs() < 1e-9);

        let stored = fx.db.latest_validation_results(&upload.id).await.unwrap();
        assert_eq!(stored.len(), 3);
        let total = stored.iter().find(|r| r.field_name == "total").unwrap();
        assert_eq!(total.user_value, "120");
        assert_eq!(total.accuracy, 1.0);

        let logs = fx.db.list_logs(10).await.unwrap();
        assert!(logs
            .iter()
            .any(|l| l.level == LogLevel::Info && l.message.contains("1 successful, 0 failed")));
    }

    #[tokio::test]
    async fn test_mock_mode_uses_sample() {
        let fx = Fixture::new();
        let runner = fx.runner(Arc::new(DownOcr));
        let document = fx.document(Some("mock")).await;

        let key = FileStore::make_key("samples", "sample.json");
        let sample = fx.files.save_text(&key, &ocr_response().to_string()).await.unwrap();
        let document = fx
            .db
            .set_document_sample_path(&document.id, &sample)
            .await
            .unwrap()
            .unwrap();
        let upload = fx.upload(&document, Some(json!({"name": "Jane Doe"}))).await;

        let result = runner.validate_upload(&document, &upload).await;
        assert!(result.is_success());
        assert_eq!(result.overall_accuracy, 1.0);
    }

    #[tokio::test]
    async fn test_per_upload_failures() {
        let fx = Fixture::new();
        let runner = fx.runner(Arc::new(DownOcr));

        let mock_without_sample = fx.document(Some("mock")).await;
        let upload = fx.upload(&mock_without_sample, Some(json!({"a": "b"}))).await;
        let result = runner.validate_upload(&mock_without_sample, &upload).await;
        assert_eq!(result.error.as_deref(), Some("Sample JSON not uploaded for document"));
        assert_eq!(result.overall_accuracy, 0.0);

        let no_url = fx.document(None).await;
        let upload = fx.upload(&no_url, Some(json!({"a": "b"}))).await;
        let result = runner.validate_upload(&no_url, &upload).await;
        assert_eq!(result.error.as_deref(), Some("Document has no OCR URL configured"));

        let real = fx.document(Some("http://ocr.local/run")).await;
        let not_object = fx.upload(&real, Some(json!(["a", "b"]))).await;
        let result = runner.validate_upload(&real, &not_object).await;
        assert_eq!(
            result.error.as_deref(),
            Some("User input JSON format invalid; expected an object")
        );

        let pending = fx.upload(&real, None).await;
        let result = runner.validate_upload(&real, &pending).await;
        assert_eq!(result.error.as_deref(), Some("Upload has no user input JSON"));

        let upload = fx.upload(&real, Some(json!({"a": "b"}))).await;
        let result = runner.validate_upload(&real, &upload).await;
        assert!(result.error.unwrap().starts_with("OCR service error"));

        let logs = fx.db.list_logs(10).await.unwrap();
        assert!(logs
            .iter()
            .any(|l| l.level == LogLevel::Error && l.message.contains("OCR request failed")));
    }

    #[tokio::test]
    async fn test_failed_uploads_do_not_fail_job() {
        let fx = Fixture::new();
        let runner = fx.runner(Arc::new(DownOcr));
        let document = fx.document(Some("http://ocr.local/run")).await;
        fx.upload(&document, Some(json!({"a": "b"}))).await;
        fx.upload(&document, Some(json!({"c": "d"}))).await;

        let job = runner.start(&document.id).await.unwrap();
        let job = fx.wait_for(&job.id).await;
        assert_eq!(job.status, JobStatus::Completed);

        let result: ValidationDocumentResult = serde_json::from_value(job.result.unwrap()).unwrap();
        assert_eq!(result.total_uploads, 2);
        assert_eq!(result.failed_uploads, 2);
    }

    #[tokio::test]
    async fn test_start_preconditions() {
        let fx = Fixture::new();
        let runner = fx.runner(Arc::new(DownOcr));

        let err = runner.start("missing").await.unwrap_err();
        assert!(matches!(err, ValidationError::NotFound(_)));

        let document = fx.document(Some("mock")).await;
        fx.upload(&document, None).await;
        let err = runner.start(&document.id).await.unwrap_err();
        assert!(matches!(err, ValidationError::Invalid(_)));
        assert_eq!(err.to_string(), NO_UPLOADS);
    }

    #[test]
    fn test_stringify_fields() {
        let fields = stringify_fields(&json!({"a": "x", "b": 1.5, "c": true, "d": null})).unwrap();
        assert_eq!(fields["a"], "x");
        assert_eq!(fields["b"], "1.5");
        assert_eq!(fields["c"], "true");
        assert_eq!(fields["d"], "null");
        assert!(stringify_fields(&json!("text")).is_none());
    }
}
