//! End-to-end validation workflow through the HTTP router, using the `mock`
//! OCR endpoint so no OCR service is needed.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use docval::api::{build_router, ApiConfig, AppState};
use docval::ocr::{HttpOcrEngine, OcrClientConfig};
use docval::storage::{Database, FileStore};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;

const BOUNDARY: &str = "workflow-boundary";

struct TestServer {
    app: Router,
    _dir: TempDir,
}

impl TestServer {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open(&dir.path().join("data")).unwrap());
        let files = Arc::new(FileStore::new(dir.path().join("storage")).unwrap());
        let ocr = Arc::new(HttpOcrEngine::new(OcrClientConfig { timeout_secs: 5 }).unwrap());

        let state = AppState::new(db, files, ocr, ApiConfig::default());
        Self {
            app: build_router(state),
            _dir: dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn post_file(&self, uri: &str, field: &str, file_name: &str, content: &[u8]) -> (StatusCode, Value) {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn wait_for_job(&self, job_id: &str) -> Value {
        for _ in 0..200 {
            let (status, job) = self.get(&format!("/api/validation/status/{}", job_id)).await;
            assert_eq!(status, StatusCode::OK);
            if job["status"] == "completed" || job["status"] == "failed" {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("validation job {} did not finish", job_id);
    }
}

fn sample_ocr_response() -> Value {
    json!({
        "information": [{
            "invoice_number": {"type": "text", "value": "INV-2041"},
            "customer": {"type": "text", "value": "Jane Doe"},
            "total": {"type": "text", "value": 199.5},
            "stamp": {"type": "image", "value": "data:image/png;base64,AAAA"}
        }],
        "processing_time": 2.25
    })
}

#[tokio::test]
async fn test_mock_validation_workflow() {
    let server = TestServer::new();

    // Project and document
    let (status, project) = server
        .post_json("/api/projects", json!({"name": "Accounts payable"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, document) = server
        .post_json(
            "/api/documents",
            json!({"project_id": project["id"], "name": "Supplier invoice", "ocr_url": "mock"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let doc_id = document["id"].as_str().unwrap().to_string();

    // Sample OCR response defines the fields
    let (status, _) = server
        .post_file(
            &format!("/api/documents/{}/sample-json", doc_id),
            "sample",
            "invoice.json",
            sample_ocr_response().to_string().as_bytes(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, fields) = server
        .get(&format!("/api/documents/{}/text-fields", doc_id))
        .await;
    assert_eq!(fields, json!(["customer", "invoice_number", "total"]));

    // Two scans; the first is typed correctly, the second has a typo
    let mut upload_ids = Vec::new();
    for (scan, values) in [
        (
            "page-1.pdf",
            json!({"invoice_number": "INV-2041", "customer": "Jane Doe", "total": 199.5}),
        ),
        (
            "page-2.TIFF",
            json!({"invoice_number": "INV-2014", "customer": "Jane Doe", "total": "199.50"}),
        ),
    ] {
        let (status, upload) = server
            .post_file(
                &format!("/api/documents/{}/upload", doc_id),
                "file",
                scan,
                b"%PDF-1.4 fake",
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let upload_id = upload["id"].as_str().unwrap().to_string();

        let (status, _) = server
            .post_file(
                &format!("/api/documents/{}/user-input", upload_id),
                "form_json",
                "values.json",
                values.to_string().as_bytes(),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        upload_ids.push(upload_id);
    }

    // A scan without user input is ignored by validation
    let (status, _) = server
        .post_file(
            &format!("/api/documents/{}/upload", doc_id),
            "file",
            "page-3.png",
            b"png",
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, uploads) = server
        .get(&format!("/api/documents/{}/uploads", doc_id))
        .await;
    assert_eq!(uploads.as_array().unwrap().len(), 2);

    // Run validation
    let (status, job) = server
        .post_json("/api/validation/run", json!({"document_id": doc_id}))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(job["status"], "pending");
    let job_id = job["id"].as_str().unwrap().to_string();

    let job = server.wait_for_job(&job_id).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["total_uploads"], 2);
    assert_eq!(job["processed_uploads"], 2);

    let (status, outcome) = server
        .get(&format!("/api/validation/result/{}", job_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["status"], "completed");

    let result = &outcome["result"];
    assert_eq!(result["document_id"], doc_id.as_str());
    assert_eq!(result["total_uploads"], 2);
    assert_eq!(result["successful_uploads"], 2);
    assert_eq!(result["failed_uploads"], 0);

    let by_upload = |id: &str| -> Value {
        result["upload_results"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["upload_id"] == id)
            .cloned()
            .unwrap()
    };

    let exact = by_upload(&upload_ids[0]);
    assert_eq!(exact["overall_accuracy"], 1.0);
    assert_eq!(exact["ocr_processing_time"], 2.25);

    let typo = by_upload(&upload_ids[1]);
    let overall = typo["overall_accuracy"].as_f64().unwrap();
    assert!(overall > 0.5 && overall < 1.0, "overall {}", overall);

    // Latest per-field results for the second upload
    let (_, fields) = server
        .get(&format!("/api/validation/upload/{}/results", upload_ids[1]))
        .await;
    let fields = fields.as_array().unwrap();
    assert_eq!(fields.len(), 3);
    let customer = fields.iter().find(|f| f["field_name"] == "customer").unwrap();
    assert_eq!(customer["accuracy"], 1.0);
    let invoice = fields
        .iter()
        .find(|f| f["field_name"] == "invoice_number")
        .unwrap();
    assert_eq!(invoice["ocr_value"], "INV-2041");
    assert!(invoice["accuracy"].as_f64().unwrap() < 1.0);

    // The completion is recorded in the event log
    let (_, logs) = server.get("/api/logs?limit=10").await;
    assert!(logs
        .as_array()
        .unwrap()
        .iter()
        .any(|l| l["level"] == "INFO" && l["message"].as_str().unwrap().contains(&job_id)));
}

#[tokio::test]
async fn test_rerun_keeps_only_latest_results() {
    let server = TestServer::new();

    let (_, project) = server.post_json("/api/projects", json!({"name": "p"})).await;
    let (_, document) = server
        .post_json(
            "/api/documents",
            json!({"project_id": project["id"], "name": "d", "ocr_url": "MOCK"}),
        )
        .await;
    let doc_id = document["id"].as_str().unwrap().to_string();

    server
        .post_file(
            &format!("/api/documents/{}/sample-json", doc_id),
            "sample",
            "s.json",
            sample_ocr_response().to_string().as_bytes(),
        )
        .await;
    let (_, upload) = server
        .post_file(&format!("/api/documents/{}/upload", doc_id), "file", "a.png", b"x")
        .await;
    let upload_id = upload["id"].as_str().unwrap().to_string();

    for values in [
        json!({"customer": "John Roe", "total": 10}),
        json!({"customer": "Jane Doe"}),
    ] {
        server
            .post_file(
                &format!("/api/documents/{}/user-input", upload_id),
                "form_json",
                "v.json",
                values.to_string().as_bytes(),
            )
            .await;
        let (_, job) = server
            .post_json("/api/validation/run", json!({"document_id": doc_id}))
            .await;
        let job = server.wait_for_job(job["id"].as_str().unwrap()).await;
        assert_eq!(job["status"], "completed");
    }

    let (_, fields) = server
        .get(&format!("/api/validation/upload/{}/results", upload_id))
        .await;
    assert_eq!(
        fields,
        json!([{
            "field_name": "customer",
            "user_value": "Jane Doe",
            "ocr_value": "Jane Doe",
            "accuracy": 1.0
        }])
    );
}

#[tokio::test]
async fn test_unreachable_ocr_is_reported_per_upload() {
    let server = TestServer::new();

    let (_, project) = server.post_json("/api/projects", json!({"name": "p"})).await;
    let (_, document) = server
        .post_json(
            "/api/documents",
            json!({"project_id": project["id"], "name": "d", "ocr_url": "http://127.0.0.1:9/ocr"}),
        )
        .await;
    let doc_id = document["id"].as_str().unwrap().to_string();

    let (_, upload) = server
        .post_file(&format!("/api/documents/{}/upload", doc_id), "file", "a.jpg", b"x")
        .await;
    server
        .post_file(
            &format!("/api/documents/{}/user-input", upload["id"].as_str().unwrap()),
            "form_json",
            "v.json",
            br#"{"customer": "Jane"}"#,
        )
        .await;

    let (_, job) = server
        .post_json("/api/validation/run", json!({"document_id": doc_id}))
        .await;
    let job_id = job["id"].as_str().unwrap().to_string();
    let job = server.wait_for_job(&job_id).await;
    assert_eq!(job["status"], "completed");

    let (_, outcome) = server
        .get(&format!("/api/validation/result/{}", job_id))
        .await;
    assert_eq!(outcome["result"]["failed_uploads"], 1);
    let error = outcome["result"]["upload_results"][0]["error"]
        .as_str()
        .unwrap();
    assert!(error.starts_with("OCR service error"), "{}", error);
}
