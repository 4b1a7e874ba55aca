//! UI Routes
//!
//! Serves the single-page UI for every path in the navigation table.
//!
//! - GET / - 308 redirect to /projects
//! - GET /projects, /projects/:projectId/documents, ... - SPA shell
//! - anything else - JSON NOT_FOUND

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, Method, Uri},
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::navigation::{resolve, Resolution};

/// Header naming the matched UI route
pub const ROUTE_HEADER: HeaderName = HeaderName::from_static("x-docval-route");

/// Shell used when no built UI is configured
const BUILTIN_SHELL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>docval</title>
</head>
<body>
  <div id="app"></div>
  <script type="module">
    import init from '/pkg/docval-ui.js';
    init();
  </script>
</body>
</html>
"#;

/// Router fallback: UI paths get the shell, everything else a 404
pub async fn ui_fallback(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
) -> ApiResult<Response> {
    if method != Method::GET && method != Method::HEAD {
        return Err(ApiError::NotFound("Route".to_string()));
    }

    match resolve(uri.path()) {
        Resolution::Redirect { to } => Ok(Redirect::permanent(to).into_response()),
        Resolution::Matched { name, .. } => {
            let shell = load_shell(&state).await?;
            let mut response = Html(shell).into_response();
            response
                .headers_mut()
                .insert(ROUTE_HEADER, HeaderValue::from_static(name.as_str()));
            Ok(response)
        }
        Resolution::NotFound => Err(ApiError::NotFound("Route".to_string())),
    }
}

async fn load_shell(state: &AppState) -> ApiResult<String> {
    match &state.ui_dist {
        Some(dist) => {
            let index = dist.join("index.html");
            tokio::fs::read_to_string(&index).await.map_err(|e| {
                ApiError::Internal(format!("Failed to read {}: {}", index.display(), e))
            })
        }
        None => Ok(BUILTIN_SHELL.to_string()),
    }
}
