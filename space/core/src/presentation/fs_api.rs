// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! File API under `/.fs`
//!
//! One handler per route that dispatches on the HTTP method. GET, PUT and
//! DELETE form the plain REST surface used by the native client, which
//! carries file metadata in `X-*` headers. Every other method is WebDAV.

use crate::domain::file_meta::{FileMeta, Permission};
use crate::domain::space_primitives::SpaceError;
use crate::presentation::api::AppState;
use crate::presentation::webdav;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::sync::Arc;
use tracing::{error, warn};

pub const FS_ROUTE: &str = "/.fs";

const X_SYNC_MODE: HeaderName = HeaderName::from_static("x-sync-mode");
const X_GET_META: HeaderName = HeaderName::from_static("x-get-meta");
const X_SPACE_PATH: HeaderName = HeaderName::from_static("x-space-path");
const X_CREATED: HeaderName = HeaderName::from_static("x-created");
const X_LAST_MODIFIED: HeaderName = HeaderName::from_static("x-last-modified");
const X_CONTENT_LENGTH: HeaderName = HeaderName::from_static("x-content-length");
const X_PERMISSION: HeaderName = HeaderName::from_static("x-permission");

/// Characters escaped inside one href path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = match request_path(&uri) {
        Ok(path) => path,
        Err(response) => return response,
    };

    match method.as_str() {
        "GET" | "HEAD" if path.is_empty() => list_files(&state, &headers).await,
        "GET" | "HEAD" => get_file(&state, &path, &headers).await,
        "PUT" => put_file(&state, &path, &headers, &body).await,
        "DELETE" => delete_file(&state, &path).await,
        "OPTIONS" => webdav::options(),
        "PROPFIND" => webdav::propfind(&state, &path, &headers).await,
        "PROPPATCH" => webdav::proppatch(&state, &path, &body),
        "MKCOL" => webdav::mkcol(&state, &path).await,
        "COPY" => webdav::copy_or_move(&state, &path, &headers, false).await,
        "MOVE" => webdav::copy_or_move(&state, &path, &headers, true).await,
        "LOCK" => webdav::lock(&state, &path, &body),
        "UNLOCK" => webdav::unlock(),
        _ => (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, webdav::ALLOWED_METHODS)],
        )
            .into_response(),
    }
}

/// Space name addressed by a request URI below `/.fs`
///
/// Percent-decoded, without leading or trailing slashes.
fn request_path(uri: &Uri) -> Result<String, Response> {
    let raw = uri.path().strip_prefix(FS_ROUTE).unwrap_or(uri.path());
    decode_space_path(raw).ok_or_else(|| {
        warn!(uri = %uri, "Could not decode request path");
        (StatusCode::BAD_REQUEST, "Invalid path encoding").into_response()
    })
}

pub(crate) fn decode_space_path(raw: &str) -> Option<String> {
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    Some(decoded.trim_matches('/').to_string())
}

/// Href of a space name, relative to the server root
pub(crate) fn space_href(prefix: &str, name: &str, collection: bool) -> String {
    let encoded = name
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");

    let mut href = format!("{}{}/{}", prefix, FS_ROUTE, encoded);
    if collection && !encoded.is_empty() {
        href.push('/');
    }
    href
}

/// RFC 1123 date in GMT, as used by `Last-Modified`
pub fn http_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .unwrap_or_default()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// RFC 3339 date, as used by WebDAV `creationdate`
pub fn rfc3339_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

async fn list_files(state: &AppState, headers: &HeaderMap) -> Response {
    if !headers.contains_key(X_SYNC_MODE) {
        return Redirect::temporary(&format!("{}/", state.url_prefix)).into_response();
    }

    match state.space.fetch_file_list().await {
        Ok(files) => (
            [
                (X_SPACE_PATH, state.space_path_header()),
                (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            ],
            Json(files),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list files");
            (StatusCode::INTERNAL_SERVER_ERROR, "Could not list files").into_response()
        }
    }
}

async fn get_file(state: &AppState, path: &str, headers: &HeaderMap) -> Response {
    if headers.contains_key(X_GET_META) {
        return match state.space.get_file_meta(path).await {
            Ok(meta) => (StatusCode::OK, file_meta_headers(&meta)).into_response(),
            Err(e) => read_error(path, e),
        };
    }

    match state.space.read_file(path).await {
        Ok((data, meta)) => (StatusCode::OK, file_meta_headers(&meta), data).into_response(),
        Err(e) => read_error(path, e),
    }
}

async fn put_file(state: &AppState, path: &str, headers: &HeaderMap, body: &[u8]) -> Response {
    let hint = file_meta_from_headers(headers, path);
    match state.space.write_file(path, body, Some(&hint)).await {
        Ok(meta) => (StatusCode::OK, file_meta_headers(&meta), "OK").into_response(),
        Err(e) if e.is_not_found() => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        Err(e) => {
            error!(path = %path, error = %e, "Write failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Write failed").into_response()
        }
    }
}

async fn delete_file(state: &AppState, path: &str) -> Response {
    match state.space.delete_file(path).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) if e.is_not_found() => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        Err(e) => {
            error!(path = %path, error = %e, "Error deleting file");
            (StatusCode::INTERNAL_SERVER_ERROR, "Delete failed").into_response()
        }
    }
}

fn read_error(path: &str, err: SpaceError) -> Response {
    if err.is_not_found() {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }
    error!(path = %path, error = %err, "Read failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Read failed").into_response()
}

/// Metadata headers mirrored on every REST response
pub fn file_meta_headers(meta: &FileMeta) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let mut set = |name: HeaderName, value: String| {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    };

    set(header::CONTENT_TYPE, meta.content_type.clone());
    set(X_CREATED, meta.created.to_string());
    set(X_LAST_MODIFIED, meta.last_modified.to_string());
    set(X_CONTENT_LENGTH, meta.size.to_string());
    set(X_PERMISSION, meta.perm.to_string());
    set(header::CACHE_CONTROL, "no-cache".to_string());
    set(
        header::ETAG,
        format!("\"{}-{}\"", meta.last_modified, meta.size),
    );
    set(header::LAST_MODIFIED, http_date(meta.last_modified));
    headers
}

/// Rebuild a metadata hint from request headers
///
/// Unparseable numbers are logged and left at zero; only `last_modified`
/// ends up influencing a write.
pub fn file_meta_from_headers(headers: &HeaderMap, path: &str) -> FileMeta {
    let text = |name: &HeaderName| headers.get(name).and_then(|v| v.to_str().ok());
    let number = |name: &HeaderName| -> Option<i64> {
        let raw = text(name)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(header = %name, value = %raw, error = %e, "Could not parse header");
                None
            }
        }
    };

    let size = number(&X_CONTENT_LENGTH)
        .or_else(|| number(&header::CONTENT_LENGTH))
        .unwrap_or(0);

    FileMeta {
        name: path.to_string(),
        created: number(&X_CREATED).unwrap_or(0),
        last_modified: number(&X_LAST_MODIFIED).unwrap_or(0),
        content_type: text(&header::CONTENT_TYPE).unwrap_or_default().to_string(),
        size: size.max(0) as u64,
        perm: text(&X_PERMISSION)
            .and_then(|p| p.parse().ok())
            .unwrap_or(Permission::ReadOnly),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_date() {
        assert_eq!(http_date(0), "Thu, 01 Jan 1970 00:00:00 GMT");
        assert_eq!(http_date(1_700_000_000_000), "Tue, 14 Nov 2023 22:13:20 GMT");
    }

    #[test]
    fn test_rfc3339_date() {
        assert_eq!(rfc3339_date(1_700_000_000_000), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_space_href_encoding() {
        assert_eq!(space_href("", "", true), "/.fs/");
        assert_eq!(space_href("", "folder", true), "/.fs/folder/");
        assert_eq!(space_href("/notes", "a b/c.md", false), "/notes/.fs/a%20b/c.md");
        assert_eq!(space_href("", "\u{00E4}.md", false), "/.fs/%C3%A4.md");
    }

    #[test]
    fn test_decode_space_path() {
        assert_eq!(decode_space_path("/a%20b/c.md").as_deref(), Some("a b/c.md"));
        assert_eq!(decode_space_path("/folder/").as_deref(), Some("folder"));
        assert_eq!(decode_space_path("").as_deref(), Some(""));
        assert_eq!(decode_space_path("/%FF"), None);
    }

    #[test]
    fn test_meta_headers_round_trip_last_modified() {
        let meta = FileMeta {
            name: "a.md".to_string(),
            created: 1,
            last_modified: 1_700_000_000_000,
            content_type: "text/markdown".to_string(),
            size: 12,
            perm: Permission::ReadWrite,
        };
        let headers = file_meta_headers(&meta);
        assert_eq!(headers["etag"], "\"1700000000000-12\"");
        assert_eq!(headers["x-permission"], "rw");
        assert_eq!(headers["last-modified"], "Tue, 14 Nov 2023 22:13:20 GMT");

        let hint = file_meta_from_headers(&headers, "a.md");
        assert_eq!(hint.last_modified, 1_700_000_000_000);
        assert_eq!(hint.size, 12);
        assert_eq!(hint.perm, Permission::ReadWrite);
    }

    #[test]
    fn test_meta_from_headers_defaults() {
        let hint = file_meta_from_headers(&HeaderMap::new(), "x.md");
        assert_eq!(hint.last_modified, 0);
        assert_eq!(hint.perm, Permission::ReadOnly);
    }
}
