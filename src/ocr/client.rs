//! OCR service client
//!
//! Posts a scan as multipart form data (`file` part) to a document's OCR
//! endpoint and returns the decoded JSON response.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Something that turns a scan into an OCR response
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(
        &self,
        endpoint: &str,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<Value, OcrError>;
}

/// Configuration for the HTTP engine
#[derive(Debug, Clone)]
pub struct OcrClientConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OcrClientConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

/// reqwest-backed OCR engine
pub struct HttpOcrEngine {
    client: Client,
    config: OcrClientConfig,
}

impl HttpOcrEngine {
    pub fn new(config: OcrClientConfig) -> Result<Self, OcrError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(OcrError::Request)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OcrClientConfig {
        &self.config
    }
}

#[async_trait]
impl OcrEngine for HttpOcrEngine {
    async fn recognize(
        &self,
        endpoint: &str,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<Value, OcrError> {
        let size = data.len();
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(OcrError::Request)?;
        let form = Form::new().part("file", part);

        tracing::debug!(endpoint = %endpoint, file = %file_name, bytes = size, "Calling OCR service");

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OcrError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| OcrError::InvalidResponse(e.to_string()))
    }
}

fn map_send_error(e: reqwest::Error) -> OcrError {
    if e.is_timeout() {
        OcrError::Timeout
    } else if e.is_connect() {
        OcrError::Unavailable
    } else {
        OcrError::Request(e)
    }
}

// ============================================
// Errors
// ============================================

/// Errors that can occur when calling the OCR service
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR service unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OCR API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("OCR request timeout")]
    Timeout,

    #[error("Invalid OCR response: {0}")]
    InvalidResponse(String),
}
