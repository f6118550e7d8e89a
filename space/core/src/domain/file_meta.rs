// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! File Metadata Value Objects
//!
//! `FileMeta` is the identity and metadata record for a single file in a
//! space. Every backend produces it and every protocol adapter consumes it,
//! so the wire shape (camelCase JSON) is fixed here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Content type used for synthesized directory entries
pub const DIRECTORY_CONTENT_TYPE: &str = "httpd/unix-directory";

/// Fallback content type when nothing better is known
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// File permission as seen by clients
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Permission {
    /// Writable
    #[default]
    #[serde(rename = "rw")]
    ReadWrite,
    /// Mutation forbidden regardless of backend
    #[serde(rename = "ro")]
    ReadOnly,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadWrite => "rw",
            Permission::ReadOnly => "ro",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rw" => Ok(Permission::ReadWrite),
            "ro" => Ok(Permission::ReadOnly),
            other => Err(format!("unknown permission: {}", other)),
        }
    }
}

/// Metadata for one file in a space
///
/// `name` is always relative to the space root, forward-slash separated,
/// and NFD-normalized. Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub name: String,
    pub created: i64,
    pub last_modified: i64,
    pub content_type: String,
    pub size: u64,
    pub perm: Permission,
}

impl FileMeta {
    /// Build a synthetic directory entry, borrowing timestamps from `sample`
    pub fn synthetic_directory(name: impl Into<String>, sample: &FileMeta) -> Self {
        Self {
            name: name.into(),
            created: sample.created,
            last_modified: sample.last_modified,
            content_type: DIRECTORY_CONTENT_TYPE.to_string(),
            size: 0,
            perm: sample.perm,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.content_type == DIRECTORY_CONTENT_TYPE
    }

    /// Last path segment of `name`
    pub fn base_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Derive a MIME type from a file path's extension
///
/// Markdown and HEIC/HEIF get explicit mappings because platform MIME
/// tables disagree on them.
pub fn lookup_content_type(path: &str) -> String {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("md") => "text/markdown".to_string(),
        Some("heic") | Some("heif") => "image/heic".to_string(),
        Some(_) => mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string(),
        None => DEFAULT_CONTENT_TYPE.to_string(),
    }
}
