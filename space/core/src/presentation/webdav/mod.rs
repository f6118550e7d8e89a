// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! WebDAV adapter
//!
//! Presents the flat `SpacePrimitives` namespace as a WebDAV resource tree.
//! Collections are synthesized on every PROPFIND from the file list; there
//! is no directory index to keep in sync.
//!
//! Locking is a handshake only: LOCK hands out a fresh token every time and
//! UNLOCK always succeeds. Nothing is persisted or enforced. The property
//! store is not writable, so PROPPATCH answers 403 for every property.

pub mod xml;

use crate::domain::directory::extract_direct_files_and_folders;
use crate::domain::file_meta::FileMeta;
use crate::domain::path_sanitizer::{clean_path, normalize_path};
use crate::domain::space_primitives::SpaceError;
use crate::presentation::api::AppState;
use crate::presentation::fs_api::{
    decode_space_path, http_date, rfc3339_date, space_href, FS_ROUTE,
};
use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, error, warn};
use xml::{ActiveLock, DavProps, DavResponse};

pub const ALLOWED_METHODS: &str =
    "GET, PUT, DELETE, PROPFIND, PROPPATCH, MKCOL, COPY, MOVE, LOCK, UNLOCK, OPTIONS";

const STATUS_OK: &str = "HTTP/1.1 200 OK";
const STATUS_FORBIDDEN: &str = "HTTP/1.1 403 Forbidden";
const LOCK_TIMEOUT: &str = "Second-3600";

const DEPTH: HeaderName = HeaderName::from_static("depth");
const DESTINATION: HeaderName = HeaderName::from_static("destination");
const OVERWRITE: HeaderName = HeaderName::from_static("overwrite");
const LOCK_TOKEN: HeaderName = HeaderName::from_static("lock-token");

/// Value of the `Depth` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Zero,
    One,
    Infinity,
}

impl Depth {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers.get(DEPTH).and_then(|v| v.to_str().ok()).map(str::trim) {
            Some("0") => Depth::Zero,
            Some("1") => Depth::One,
            _ => Depth::Infinity,
        }
    }
}

pub fn options() -> Response {
    (
        StatusCode::OK,
        [
            (header::ALLOW, ALLOWED_METHODS),
            (HeaderName::from_static("dav"), "1, 2"),
            (HeaderName::from_static("ms-author-via"), "DAV"),
        ],
    )
        .into_response()
}

/// List a file, or a collection and (unless `Depth: 0`) its direct children
///
/// Depth is capped at one level: `infinity` behaves like `1`.
pub async fn propfind(state: &AppState, path: &str, headers: &HeaderMap) -> Response {
    let depth = Depth::from_headers(headers);
    debug!(path = %path, ?depth, "PROPFIND");

    if let Ok(meta) = state.space.get_file_meta(path).await {
        return multistatus(StatusCode::MULTI_STATUS, &[file_response(state, &meta)]);
    }

    if !state.space.is_directory(path).await {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }

    let mut responses = vec![collection_response(state, path)];
    if depth != Depth::Zero {
        let files = match state.space.fetch_file_list().await {
            Ok(files) => files,
            Err(e) => {
                error!(error = %e, "PROPFIND listing failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Listing failed").into_response();
            }
        };

        // Layered backends may report a name twice; the first layer wins
        let mut seen = HashSet::new();
        for child in extract_direct_files_and_folders(&files, path) {
            if seen.insert(child.name.clone()) {
                responses.push(file_response(state, &child));
            }
        }
    }

    multistatus(StatusCode::MULTI_STATUS, &responses)
}

pub fn proppatch(state: &AppState, path: &str, body: &[u8]) -> Response {
    let names = match xml::parse_proppatch_names(body) {
        Ok(names) => names,
        Err(e) => {
            debug!(path = %path, error = %e, "Ignoring unreadable PROPPATCH body");
            Vec::new()
        }
    };

    let response = DavResponse {
        href: space_href(&state.url_prefix, path, false),
        props: DavProps {
            names,
            ..Default::default()
        },
        status: STATUS_FORBIDDEN.to_string(),
    };
    multistatus(StatusCode::MULTI_STATUS, &[response])
}

pub async fn mkcol(state: &AppState, path: &str) -> Response {
    if path.is_empty() {
        return (StatusCode::FORBIDDEN, "Cannot create collection at root").into_response();
    }
    if state.space.get_file_meta(path).await.is_ok() || state.space.is_directory(path).await {
        return (StatusCode::METHOD_NOT_ALLOWED, "Resource already exists").into_response();
    }

    match state.space.create_directory(path).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(SpaceError::AlreadyExists(_)) => {
            (StatusCode::METHOD_NOT_ALLOWED, "Resource already exists").into_response()
        }
        Err(e) => {
            warn!(path = %path, error = %e, "MKCOL failed");
            mutation_error(e, "Failed to create collection")
        }
    }
}

/// COPY, or MOVE when `remove_source` is set
///
/// MOVE deletes the source after the destination is written. If that
/// delete fails the destination is deleted again, best effort. A
/// destination naming the source itself is refused with 403.
pub async fn copy_or_move(
    state: &AppState,
    source: &str,
    headers: &HeaderMap,
    remove_source: bool,
) -> Response {
    let verb = if remove_source { "MOVE" } else { "COPY" };

    let Some(destination) = headers.get(DESTINATION).and_then(|v| v.to_str().ok()) else {
        return (StatusCode::BAD_REQUEST, "Missing Destination header").into_response();
    };
    let Some(target) = destination_path(destination) else {
        warn!(destination = %destination, "Could not parse Destination");
        return (StatusCode::BAD_REQUEST, "Invalid Destination header").into_response();
    };
    if same_resource(source, &target) {
        warn!(path = %source, "{} onto itself refused", verb);
        return (StatusCode::FORBIDDEN, "Source and destination are the same").into_response();
    }
    let overwrite = headers
        .get(OVERWRITE)
        .and_then(|v| v.to_str().ok())
        .is_none_or(|v| v.trim() != "F");

    let (data, meta) = match state.space.read_file(source).await {
        Ok(found) => found,
        Err(e) if e.is_not_found() => return (StatusCode::NOT_FOUND, "Not Found").into_response(),
        Err(e) => {
            error!(path = %source, error = %e, "{} read failed", verb);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Read failed").into_response();
        }
    };

    let target_exists = state.space.get_file_meta(&target).await.is_ok();
    if target_exists && !overwrite {
        return (
            StatusCode::PRECONDITION_FAILED,
            "Destination exists and overwrite is false",
        )
            .into_response();
    }

    if let Err(e) = state.space.write_file(&target, &data, Some(&meta)).await {
        error!(from = %source, to = %target, error = %e, "{} write failed", verb);
        return mutation_error(e, "Failed to write destination");
    }

    if remove_source {
        if let Err(e) = state.space.delete_file(source).await {
            error!(path = %source, error = %e, "MOVE delete failed, rolling back");
            if let Err(rollback) = state.space.delete_file(&target).await {
                warn!(path = %target, error = %rollback, "MOVE rollback failed");
            }
            return mutation_error(e, "Failed to move resource");
        }
    }

    if target_exists {
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::CREATED.into_response()
    }
}

/// Hand out a fresh, unenforced exclusive write lock
pub fn lock(state: &AppState, path: &str, body: &[u8]) -> Response {
    let token = format!("opaquelocktoken:{}", uuid::Uuid::new_v4());

    let owner = if body.is_empty() {
        None
    } else {
        xml::parse_lock_owner(body).unwrap_or_else(|e| {
            debug!(path = %path, error = %e, "Ignoring unreadable LOCK body");
            None
        })
    };

    let response = DavResponse {
        href: space_href(&state.url_prefix, path, false),
        props: DavProps {
            lock_discovery: Some(ActiveLock {
                token: token.clone(),
                owner,
                depth: "0".to_string(),
                timeout: LOCK_TIMEOUT.to_string(),
            }),
            ..Default::default()
        },
        status: STATUS_OK.to_string(),
    };

    let mut response = multistatus(StatusCode::OK, &[response]);
    if let Ok(value) = HeaderValue::from_str(&format!("<{}>", token)) {
        response.headers_mut().insert(LOCK_TOKEN, value);
    }
    response
}

pub fn unlock() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Space name a `Destination` header points at
///
/// Accepts absolute URLs and plain paths; everything after `/.fs/` is the
/// percent-encoded name. A destination naming the space root is rejected.
pub fn destination_path(destination: &str) -> Option<String> {
    let marker = format!("{}/", FS_ROUTE);
    let (_, encoded) = destination.split_once(&marker)?;
    decode_space_path(encoded).filter(|path| !path.is_empty())
}

/// Whether two space names address the same file once normalized
fn same_resource(a: &str, b: &str) -> bool {
    let canonical = |name: &str| clean_path(Path::new(&normalize_path(name)));
    canonical(a) == canonical(b)
}

fn file_response(state: &AppState, meta: &FileMeta) -> DavResponse {
    let collection = meta.is_directory();
    DavResponse {
        href: space_href(&state.url_prefix, &meta.name, collection),
        props: DavProps {
            display_name: Some(meta.base_name().to_string()),
            content_length: (!collection).then_some(meta.size),
            content_type: Some(meta.content_type.clone()),
            last_modified: Some(http_date(meta.last_modified)),
            creation_date: Some(rfc3339_date(meta.created)),
            resource_type: Some(collection),
            supported_lock: true,
            ..Default::default()
        },
        status: STATUS_OK.to_string(),
    }
}

fn collection_response(state: &AppState, path: &str) -> DavResponse {
    let now = chrono::Utc::now().timestamp_millis();
    DavResponse {
        href: space_href(&state.url_prefix, path, true),
        props: DavProps {
            display_name: Some(path.rsplit('/').next().unwrap_or(path).to_string()),
            last_modified: Some(http_date(now)),
            creation_date: Some(rfc3339_date(now)),
            resource_type: Some(true),
            supported_lock: true,
            ..Default::default()
        },
        status: STATUS_OK.to_string(),
    }
}

fn multistatus(status: StatusCode, responses: &[DavResponse]) -> Response {
    match xml::write_multistatus(responses) {
        Ok(body) => (
            status,
            [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render multistatus");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

fn mutation_error(err: SpaceError, message: &'static str) -> Response {
    let status = match err {
        SpaceError::NotFound(_) | SpaceError::PathOutsideRoot(_) => StatusCode::NOT_FOUND,
        SpaceError::NotAllowed(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, message).into_response()
}
