//! OCR
//!
//! - **client**: `OcrEngine` trait and the HTTP implementation
//! - **fields**: text field extraction and similarity scoring

pub mod client;
pub mod fields;

pub use client::{HttpOcrEngine, OcrClientConfig, OcrEngine, OcrError};
pub use fields::{compare_fields, extract_text_fields, string_similarity};
