// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Space Primitives Trait - Anti-Corruption Layer for space storage
//!
//! The narrow contract every storage backend implements: disk, the
//! compiled-in bundle overlay, the read-only policy wrapper and the
//! in-memory store. Protocol adapters (REST, WebDAV) only ever talk to a
//! `SpacePrimitives` chain and never to a concrete backend.
//!
//! The namespace is flat: files are addressed by slash-separated names
//! relative to the space root. Directories exist only as common prefixes
//! and are created and pruned as a side effect of writes and deletes.

use crate::domain::file_meta::FileMeta;
use async_trait::async_trait;
use thiserror::Error;

/// Storage contract for one space
///
/// Implementations hold no open file handles between calls. Every method
/// may block on disk latency; none are transactional with each other.
#[async_trait]
pub trait SpacePrimitives: Send + Sync {
    /// Full, unordered snapshot of every file in the space
    async fn fetch_file_list(&self) -> Result<Vec<FileMeta>, SpaceError>;

    /// Metadata for a single file
    async fn get_file_meta(&self, path: &str) -> Result<FileMeta, SpaceError>;

    /// File content together with its metadata
    async fn read_file(&self, path: &str) -> Result<(Vec<u8>, FileMeta), SpaceError>;

    /// Create or overwrite a file
    ///
    /// `meta` may only influence `last_modified`. The returned metadata
    /// reflects what was actually stored.
    async fn write_file(
        &self,
        path: &str,
        data: &[u8],
        meta: Option<&FileMeta>,
    ) -> Result<FileMeta, SpaceError>;

    /// Remove a file
    async fn delete_file(&self, path: &str) -> Result<(), SpaceError>;

    /// Create an (empty) directory
    async fn create_directory(&self, path: &str) -> Result<(), SpaceError>;

    /// Whether `path` names a directory
    async fn is_directory(&self, path: &str) -> bool;
}

/// Space storage errors
#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Path outside space root: {0}")]
    PathOutsideRoot(String),

    #[error("Not allowed: {0}")]
    NotAllowed(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Could not write file: {0}")]
    CouldNotWrite(String),

    #[error("Could not get file meta: {0}")]
    CouldNotGetMeta(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl SpaceError {
    /// True for errors a caller should treat as "there is nothing there"
    pub fn is_not_found(&self) -> bool {
        matches!(self, SpaceError::NotFound(_) | SpaceError::PathOutsideRoot(_))
    }
}

impl From<std::io::Error> for SpaceError {
    fn from(err: std::io::Error) -> Self {
        SpaceError::Io(err.to_string())
    }
}
