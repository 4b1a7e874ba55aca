//! docval UI
//!
//! Browser front end for the docval OCR validation service, built with
//! Leptos (WASM).
//!
//! # Views
//!
//! - Projects listing and creation
//! - Documents of a project
//! - Document detail: OCR endpoint, sample JSON, scans and validation runs
//! - Upload detail: user-input JSON and per-field results
//!
//! # Architecture
//!
//! This is a client-side rendered (CSR) Leptos application that compiles to
//! WebAssembly. The docval API server serves it for every UI path and it
//! talks to the REST API over HTTP.

use leptos::*;

mod api;
mod app;
mod components;
mod pages;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
