// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Disk Space Primitives
//!
//! Real filesystem backend for a space. Every incoming name goes through the
//! [`PathSanitizer`] (NFD normalization plus root confinement) before it
//! touches the disk, and every listed name is normalized on the way out.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements `SpacePrimitives` over a local directory tree
//!
//! Directories are never reported. They are created on demand when a file
//! is written and pruned when the last file below them is deleted.

use crate::domain::file_meta::{lookup_content_type, FileMeta, Permission};
use crate::domain::metrics::{NoopMetrics, SpaceMetrics};
use crate::domain::path_sanitizer::PathSanitizer;
use crate::domain::space_primitives::{SpaceError, SpacePrimitives};
use crate::infrastructure::storage::gitignore::IgnoreMatcher;
use crate::infrastructure::storage::walker::SpaceWalker;
use async_trait::async_trait;
use filetime::FileTime;
use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Filesystem-backed space storage
pub struct DiskSpacePrimitives {
    sanitizer: PathSanitizer,
    ignore: Arc<IgnoreMatcher>,
    walker: Arc<SpaceWalker>,
    metrics: Arc<dyn SpaceMetrics>,
}

impl DiskSpacePrimitives {
    /// Open (and create if needed) the space at `root`
    ///
    /// `walk_threads` bounds the parallelism of full listings.
    pub fn new(root: impl AsRef<Path>, walk_threads: usize) -> Result<Self, SpaceError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|e| {
            SpaceError::Io(format!(
                "Failed to create space folder {}: {}",
                root.display(),
                e
            ))
        })?;

        let sanitizer = PathSanitizer::new(root)?;
        let walker = SpaceWalker::new(walk_threads)
            .map_err(|e| SpaceError::Io(format!("Failed to start walker pool: {}", e)))?;

        info!(root = %sanitizer.root().display(), "Opened disk space");

        Ok(Self {
            sanitizer,
            ignore: Arc::new(IgnoreMatcher::default()),
            walker: Arc::new(walker),
            metrics: Arc::new(NoopMetrics),
        })
    }

    /// Exclude files matching gitignore-style `patterns` from listings
    pub fn with_ignore(mut self, patterns: &str) -> Self {
        self.ignore = Arc::new(IgnoreMatcher::from_lines(patterns));
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn SpaceMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn root(&self) -> &Path {
        self.sanitizer.root()
    }

    /// Remove now-empty parents of `path`, stopping at the first directory
    /// that cannot be removed or at the space root
    async fn clean_orphaned_parents(&self, path: &Path) {
        let root = self.sanitizer.root();
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == root || !dir.starts_with(root) {
                break;
            }
            // remove_dir only succeeds on empty directories
            if let Err(e) = tokio::fs::remove_dir(dir).await {
                debug!(dir = %dir.display(), error = %e, "Stopping orphan cleanup");
                break;
            }
            debug!(dir = %dir.display(), "Removed orphaned directory");
            current = dir.parent();
        }
    }

    async fn stat_file(&self, path: &str, full: &Path) -> Result<FileMeta, SpaceError> {
        let metadata = tokio::fs::metadata(full)
            .await
            .map_err(|e| map_io_error(path, e, SpaceError::CouldNotGetMeta))?;
        if !metadata.is_file() {
            return Err(SpaceError::NotFound(path.to_string()));
        }
        Ok(file_meta_from(self.sanitizer.to_space_name(full), &metadata))
    }
}

#[async_trait]
impl SpacePrimitives for DiskSpacePrimitives {
    async fn fetch_file_list(&self) -> Result<Vec<FileMeta>, SpaceError> {
        let sanitizer = self.sanitizer.clone();
        let ignore = self.ignore.clone();
        let walker = self.walker.clone();

        let files = tokio::task::spawn_blocking(move || {
            walker.walk(sanitizer.root(), |path, metadata| {
                if path.extension().is_none() {
                    return None;
                }
                let name = sanitizer.to_space_name(path);
                if ignore.is_ignored(&name) {
                    return None;
                }
                Some(file_meta_from(name, metadata))
            })
        })
        .await
        .map_err(|e| SpaceError::Io(format!("Listing task failed: {}", e)))?;

        self.metrics.record_file_count(files.len());
        Ok(files)
    }

    async fn get_file_meta(&self, path: &str) -> Result<FileMeta, SpaceError> {
        let full = self.sanitizer.safe_path(path)?;
        self.stat_file(path, &full).await
    }

    async fn read_file(&self, path: &str) -> Result<(Vec<u8>, FileMeta), SpaceError> {
        let full = self.sanitizer.safe_path(path)?;
        let meta = self.stat_file(path, &full).await?;
        let data = tokio::fs::read(&full)
            .await
            .map_err(|e| map_io_error(path, e, SpaceError::Io))?;
        Ok((data, meta))
    }

    async fn write_file(
        &self,
        path: &str,
        data: &[u8],
        meta: Option<&FileMeta>,
    ) -> Result<FileMeta, SpaceError> {
        let full = self.sanitizer.safe_path(path)?;

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SpaceError::CouldNotWrite(format!("{}: {}", path, e)))?;
        }
        tokio::fs::write(&full, data)
            .await
            .map_err(|e| SpaceError::CouldNotWrite(format!("{}: {}", path, e)))?;

        if let Some(meta) = meta.filter(|m| m.last_modified > 0) {
            let mtime = FileTime::from_unix_time(
                meta.last_modified.div_euclid(1000),
                (meta.last_modified.rem_euclid(1000) * 1_000_000) as u32,
            );
            // Content is already written, the re-stat reports the real mtime
            if let Err(e) = filetime::set_file_mtime(&full, mtime) {
                warn!(path = %path, error = %e, "Could not set modification time");
            }
        }

        debug!(path = %path, size = data.len(), "Wrote file");
        self.stat_file(path, &full).await
    }

    async fn delete_file(&self, path: &str) -> Result<(), SpaceError> {
        let full = self.sanitizer.safe_path(path)?;
        self.stat_file(path, &full).await?;

        tokio::fs::remove_file(&full)
            .await
            .map_err(|e| map_io_error(path, e, SpaceError::Io))?;
        debug!(path = %path, "Deleted file");

        self.clean_orphaned_parents(&full).await;
        Ok(())
    }

    async fn create_directory(&self, path: &str) -> Result<(), SpaceError> {
        let full = self.sanitizer.safe_path(path)?;
        if tokio::fs::try_exists(&full).await.unwrap_or(false) {
            return Err(SpaceError::AlreadyExists(path.to_string()));
        }
        tokio::fs::create_dir_all(&full)
            .await
            .map_err(|e| map_io_error(path, e, SpaceError::Io))
    }

    async fn is_directory(&self, path: &str) -> bool {
        let Ok(full) = self.sanitizer.safe_path(path) else {
            return false;
        };
        tokio::fs::metadata(&full)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}

fn file_meta_from(name: String, metadata: &Metadata) -> FileMeta {
    let last_modified = metadata.modified().map(system_time_millis).unwrap_or(0);
    let created = creation_millis(metadata).unwrap_or(last_modified);
    FileMeta {
        content_type: lookup_content_type(&name),
        name,
        created,
        last_modified,
        size: metadata.len(),
        perm: Permission::ReadWrite,
    }
}

fn system_time_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Birth time where the platform records it, change time otherwise
fn creation_millis(metadata: &Metadata) -> Option<i64> {
    metadata
        .created()
        .ok()
        .map(system_time_millis)
        .or_else(|| change_millis(metadata))
}

#[cfg(unix)]
fn change_millis(metadata: &Metadata) -> Option<i64> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.ctime() * 1000 + metadata.ctime_nsec() / 1_000_000)
}

#[cfg(not(unix))]
fn change_millis(_metadata: &Metadata) -> Option<i64> {
    None
}

/// Map an I/O error for `path`, folding "missing" and "unrepresentable
/// name" failures into `NotFound`
fn map_io_error(path: &str, err: io::Error, other: fn(String) -> SpaceError) -> SpaceError {
    if matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    ) || is_syntax_error(&err)
    {
        SpaceError::NotFound(path.to_string())
    } else {
        other(format!("{}: {}", path, err))
    }
}

/// Errors raised for names the filesystem cannot express
pub(crate) fn is_syntax_error(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::InvalidInput {
        return true;
    }

    #[cfg(unix)]
    const SYNTAX_CODES: &[i32] = &[libc::EBADF, libc::EINVAL];
    #[cfg(windows)]
    const SYNTAX_CODES: &[i32] = &[123]; // ERROR_INVALID_NAME
    #[cfg(not(any(unix, windows)))]
    const SYNTAX_CODES: &[i32] = &[];

    if err.raw_os_error().is_some_and(|code| SYNTAX_CODES.contains(&code)) {
        return true;
    }
    err.to_string().to_lowercase().contains("syntax")
}
