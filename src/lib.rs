//! # docval
//!
//! OCR validation service: compare what an OCR service reads from scanned
//! documents with the values a person typed for the same scans.
//!
//! ## Features
//!
//! - **Projects and documents**: group document types, each with its own OCR endpoint
//! - **Sample-driven fields**: the text fields of a sample OCR response define what is compared
//! - **Background validation**: jobs score every upload and report progress
//! - **Mock OCR**: the literal endpoint `mock` replays the sample response
//! - **Web UI**: a Leptos single-page app served from the same process
//!
//! ## Modules
//!
//! - [`storage`]: SQLite records and the file store
//! - [`ocr`]: OCR client and field similarity scoring
//! - [`validation`]: Background validation jobs
//! - [`navigation`]: UI route table shared by the server and the UI
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docval::ocr::{compare_fields, extract_text_fields};
//! use serde_json::json;
//! use std::collections::BTreeMap;
//!
//! let ocr = json!({"information": [{"name": {"type": "text", "value": "Jane Doe"}}]});
//! let user = BTreeMap::from([("name".to_string(), "Jane Do".to_string())]);
//!
//! let (scores, overall) = compare_fields(&user, &extract_text_fields(&ocr));
//! println!("name: {:.2}, overall: {:.2}", scores["name"], overall);
//! ```

pub mod api;
pub mod config;
pub mod navigation;
pub mod ocr;
pub mod storage;
pub mod validation;

// Re-export top-level types for convenience
pub use storage::{
    Database, Document, FieldResult, FileStore, JobStatus, LogEntry, LogLevel, Project,
    StorageError, StorageResult, Upload, ValidationJob,
};

pub use ocr::{HttpOcrEngine, OcrClientConfig, OcrEngine, OcrError};

pub use validation::{JobRunner, ValidationDocumentResult, ValidationError, ValidationUploadResult};

pub use navigation::{resolve, Resolution, RouteName, RouteError};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, ConfigSource, LoadedConfig};
