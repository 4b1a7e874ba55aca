//! docval Storage
//!
//! Persistence for the validation workflow:
//!
//! - **types**: Records (Project, Document, Upload, ValidationJob, LogEntry)
//! - **database**: SQLite record store
//! - **files**: Date-prefixed filesystem store for scans and JSON payloads
//! - **error**: Error types
//!
//! # Layout
//!
//! ```text
//! <data_dir>/docval.db
//! <storage_dir>/dd-mm-yyyy/uploads/doc_<document>_<file>
//! <storage_dir>/dd-mm-yyyy/samples/doc_<document>_sample.json
//! <storage_dir>/dd-mm-yyyy/user_inputs/upload_<upload>_user.json
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use docval::storage::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::open(std::path::Path::new("./data"))?;
//!
//!     let project = db.create_project("claims").await?;
//!     let document = db.create_document(&project.id, "claim form", Some("mock")).await?;
//!
//!     println!("{} documents", db.list_documents(Some(&project.id)).await?.len());
//!     let _ = document;
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod files;
pub mod types;

pub use database::{Database, MAX_LOG_LIMIT};
pub use error::{StorageError, StorageResult};
pub use files::FileStore;
pub use types::{
    Document, FieldResult, JobStatus, JobUpdate, LogEntry, LogLevel, Project, Upload,
    ValidationJob,
};
