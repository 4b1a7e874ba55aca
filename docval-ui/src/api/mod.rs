//! REST API access for the UI

mod client;

pub use client::*;
