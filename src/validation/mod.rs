//! Validation
//!
//! Compares the values users typed for each scan with what the OCR service
//! read from it.
//!
//! - **jobs**: `JobRunner`, background execution of validation jobs
//! - **results**: per-upload and per-document result records, CSV export

pub mod jobs;
pub mod results;

pub use jobs::{JobRunner, ValidationError};
pub use results::{results_to_csv, ValidationDocumentResult, ValidationUploadResult};
