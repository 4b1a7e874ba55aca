//! docval REST API
//!
//! HTTP API layer for docval, built with Axum.
//!
//! # Endpoints
//!
//! ## Projects
//! - `POST /api/projects` - Create a project
//! - `GET /api/projects` - List projects
//! - `GET /api/projects/:id` - Get a project
//! - `PATCH /api/projects/:id` - Rename a project
//!
//! ## Documents
//! - `POST /api/documents` - Create a document
//! - `GET /api/documents?project_id=` - List documents
//! - `GET /api/documents/:id` - Get a document
//! - `PATCH /api/documents/:id` - Update a document
//! - `POST /api/documents/:id/sample-json` - Attach the sample OCR response
//! - `GET /api/documents/:id/text-fields` - Text fields of the sample
//! - `POST /api/documents/:id/upload` - Upload a scan
//! - `POST /api/documents/:id/user-input` - Attach user values to an upload
//! - `GET /api/documents/:id/uploads` - List uploads
//!
//! ## Uploads
//! - `GET /api/uploads/:id` - Get an upload
//! - `GET /api/uploads/:id/file` - Download the scan
//!
//! ## Validation
//! - `POST /api/validation/run` - Start a validation job
//! - `GET /api/validation/status/:job_id` - Job status
//! - `GET /api/validation/result/:job_id` - Job result
//! - `GET /api/validation/upload/:upload_id/results` - Latest field results
//!
//! ## Logs
//! - `GET /api/logs` - Recent events
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## UI
//! - `GET /` - Redirect to `/projects`
//! - `GET /pkg/*` - Built UI assets
//! - UI paths serve the single-page shell
//!
//! # Example
//!
//! ```rust,ignore
//! use docval::api::{serve, AppState};
//! use docval::config::Config;
//! use docval::ocr::{HttpOcrEngine, OcrClientConfig};
//! use docval::storage::{Database, FileStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let db = Arc::new(Database::open(&config.storage.data_path())?);
//!     let files = Arc::new(FileStore::new(config.storage.storage_path())?);
//!     let ocr = Arc::new(HttpOcrEngine::new(OcrClientConfig::default())?);
//!
//!     let state = AppState::new(db, files, ocr, config.api.clone());
//!     serve(state, &config.api).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use crate::config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Project routes
        .route(
            "/projects",
            post(routes::projects::create_project).get(routes::projects::list_projects),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project).patch(routes::projects::update_project),
        )
        // Document routes
        .route(
            "/documents",
            post(routes::documents::create_document).get(routes::documents::list_documents),
        )
        .route(
            "/documents/:id",
            get(routes::documents::get_document).patch(routes::documents::update_document),
        )
        .route(
            "/documents/:id/sample-json",
            post(routes::documents::upload_sample_json),
        )
        .route(
            "/documents/:id/text-fields",
            get(routes::documents::get_text_fields),
        )
        .route("/documents/:id/upload", post(routes::documents::upload_file))
        .route(
            "/documents/:id/user-input",
            post(routes::documents::upload_user_input),
        )
        .route("/documents/:id/uploads", get(routes::documents::list_uploads))
        // Upload routes
        .route("/uploads/:id", get(routes::uploads::get_upload))
        .route("/uploads/:id/file", get(routes::uploads::download_file))
        // Validation routes
        .route("/validation/run", post(routes::validation::run_validation))
        .route(
            "/validation/status/:job_id",
            get(routes::validation::get_status),
        )
        .route(
            "/validation/result/:job_id",
            get(routes::validation::get_result),
        )
        .route(
            "/validation/upload/:upload_id/results",
            get(routes::validation::get_upload_results),
        )
        // Log routes
        .route("/logs", get(routes::logs::list_logs))
        .layer(DefaultBodyLimit::max(state.config.max_body_size));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let ui_dist = state.ui_dist.clone();
    let shared_state = Arc::new(state);

    let mut router = Router::new()
        .nest("/api", api_routes)
        .nest("/health", health_routes);

    if let Some(dist) = ui_dist {
        router = router.nest_service("/pkg", ServeDir::new(dist.join("pkg")));
    }

    router
        .fallback(routes::ui::ui_fallback)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive CORS unless specific origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("docval API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("docval API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
