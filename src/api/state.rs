//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::config::ApiConfig;
use crate::ocr::OcrEngine;
use crate::storage::{Database, FileStore};
use crate::validation::JobRunner;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store
    pub db: Arc<Database>,
    /// Scans, samples and user input files
    pub files: Arc<FileStore>,
    /// Background validation jobs
    pub jobs: Arc<JobRunner>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Built web UI, if any
    pub ui_dist: Option<PathBuf>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        files: Arc<FileStore>,
        ocr: Arc<dyn OcrEngine>,
        config: ApiConfig,
    ) -> Self {
        let jobs = Arc::new(JobRunner::new(Arc::clone(&db), Arc::clone(&files), ocr));

        Self {
            db,
            files,
            jobs,
            config: Arc::new(config),
            ui_dist: None,
            start_time: Instant::now(),
        }
    }

    /// Serve the web UI from `dist`
    pub fn with_ui_dist(mut self, dist: Option<PathBuf>) -> Self {
        self.ui_dist = dist;
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
