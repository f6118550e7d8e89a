// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP surface of a space
//!
//! Routes:
//!
//! | Path | Handler |
//! |------|---------|
//! | `/.ping` | liveness, reports the space folder |
//! | `/.config` | boot configuration for the web client |
//! | `/.fs`, `/.fs/{*path}` | REST file API and WebDAV, dispatched on method |
//! | anything else | web client bundle |
//!
//! Everything is nested under the configured URL prefix when there is one.

use crate::domain::metrics::{NoopMetrics, SpaceMetrics};
use crate::domain::space_primitives::SpacePrimitives;
use crate::presentation::fs_api::{self, http_date};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Largest request body accepted by PUT
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Client boot configuration served at `/.config`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootConfig {
    pub space_folder_path: String,
    pub index_page: String,
    pub read_only: bool,
}

pub struct AppState {
    pub space: Arc<dyn SpacePrimitives>,
    pub client_bundle: Arc<dyn SpacePrimitives>,
    pub boot: BootConfig,
    /// Normalized prefix ("" or "/x") every route is mounted under
    pub url_prefix: String,
    pub metrics: Arc<dyn SpaceMetrics>,
}

impl AppState {
    pub fn new(
        space: Arc<dyn SpacePrimitives>,
        client_bundle: Arc<dyn SpacePrimitives>,
        boot: BootConfig,
    ) -> Self {
        Self {
            space,
            client_bundle,
            boot,
            url_prefix: String::new(),
            metrics: Arc::new(NoopMetrics),
        }
    }

    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn SpaceMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// `X-Space-Path` header value
    pub(crate) fn space_path_header(&self) -> HeaderValue {
        HeaderValue::from_bytes(self.boot.space_folder_path.as_bytes())
            .unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}

pub fn app(state: AppState) -> Router {
    let state = Arc::new(state);
    let prefix = state.url_prefix.clone();

    let routes = Router::new()
        .route("/.ping", get(ping))
        .route("/.config", get(boot_config))
        .route("/.fs", any(fs_api::dispatch))
        .route("/.fs/", any(fs_api::dispatch))
        .route("/.fs/{*path}", any(fs_api::dispatch))
        .fallback(client_bundle)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .with_state(state);

    if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(&prefix, routes)
    }
}

async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let response = next.run(request).await;
    state.metrics.record_request(&method, response.status().as_u16());
    response
}

async fn ping(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (
                header::HeaderName::from_static("x-space-path"),
                state.space_path_header(),
            ),
        ],
        "OK",
    )
}

async fn boot_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-cache")],
        Json(state.boot.clone()),
    )
}

/// Serve the web client for any route not claimed above
///
/// Unknown page-like paths get the client's `index.html`, so deep links
/// into the app load the shell. Unknown asset paths are 404.
async fn client_bundle(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let requested = uri.path().trim_start_matches('/');
    let path = if requested.is_empty() {
        "index.html"
    } else {
        requested
    };

    let found = match state.client_bundle.read_file(path).await {
        Ok(found) => Ok(found),
        Err(_) if is_page_like(path) => state.client_bundle.read_file("index.html").await,
        Err(e) => Err(e),
    };
    let (data, meta) = match found {
        Ok(found) => found,
        Err(_) => {
            debug!(path = %path, "Not in client bundle");
            return (StatusCode::NOT_FOUND, "Not Found").into_response();
        }
    };

    let last_modified = http_date(meta.last_modified);
    let not_modified = headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|since| since == last_modified);
    if not_modified {
        return StatusCode::NOT_MODIFIED.into_response();
    }

    (
        [
            (header::CONTENT_TYPE, meta.content_type),
            (header::LAST_MODIFIED, last_modified),
        ],
        data,
    )
        .into_response()
}

fn is_page_like(path: &str) -> bool {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        None => !path.starts_with('.'),
        Some(ext) => ext.eq_ignore_ascii_case("md"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_like_paths() {
        assert!(is_page_like("Journal/2025-01-01"));
        assert!(is_page_like("index.md"));
        assert!(!is_page_like("client.js"));
        assert!(!is_page_like(".client/manifest"));
    }
}
