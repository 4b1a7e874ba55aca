//! API Routes
//!
//! Route handlers organized by functionality.

pub mod documents;
pub mod health;
pub mod logs;
pub mod projects;
pub mod ui;
pub mod uploads;
pub mod validation;

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::api::error::{ApiError, ApiResult};

/// A file taken from a multipart body
pub(crate) struct FilePart {
    pub file_name: String,
    pub data: Bytes,
}

/// Read the first part named `field_name`, skipping any others
pub(crate) async fn read_file_field(
    mut multipart: Multipart,
    field_name: &str,
) -> ApiResult<FilePart> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        return Ok(FilePart { file_name, data });
    }

    Err(ApiError::Validation(format!(
        "Missing file field '{}'",
        field_name
    )))
}

/// Whether a client file name has a `.json` extension
pub(crate) fn is_json_file(file_name: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(".json")
}

/// Parse bytes as JSON or reject the request
pub(crate) fn parse_json(data: &[u8]) -> ApiResult<serde_json::Value> {
    serde_json::from_slice(data).map_err(|_| ApiError::Validation("Invalid JSON content".to_string()))
}
