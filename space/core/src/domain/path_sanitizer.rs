// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path Sanitizer Domain Service
//!
//! Resolves space-relative file names to absolute filesystem paths and
//! prevents traversal out of the space root. This is a domain service (not
//! infrastructure) because path confinement is a core security rule.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Lexical path cleaning, root confinement, Unicode normalization

use crate::domain::space_primitives::SpaceError;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Path sanitization errors
#[derive(Debug, Error)]
pub enum PathSanitizerError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path outside space root: {0}")]
    OutsideBoundary(String),

    #[error("Path too long: {0}")]
    PathTooLong(String),
}

impl From<PathSanitizerError> for SpaceError {
    fn from(err: PathSanitizerError) -> Self {
        match err {
            PathSanitizerError::OutsideBoundary(path) => SpaceError::PathOutsideRoot(path),
            // Names the filesystem could never hold behave like missing files
            PathSanitizerError::InvalidPath(path) | PathSanitizerError::PathTooLong(path) => {
                SpaceError::NotFound(path)
            }
        }
    }
}

/// Normalize a path to Unicode NFD (canonical decomposition)
///
/// APFS stores names decomposed while most Linux filesystems keep whatever
/// bytes they were given. Normalizing at the application boundary makes
/// "Ä" typed as one code point and "A" + combining diaeresis address the
/// same file everywhere.
pub fn normalize_path(path: &str) -> String {
    path.nfd().collect()
}

/// Lexically clean a path: drop `.` components and fold `..` into the
/// preceding normal component
///
/// Leading `..` components of a relative path are kept, `..` directly under
/// the root is dropped. An empty result becomes `.`.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Path sanitizer bound to one space root
///
/// # Security Guarantees
/// - Absolute inputs are rejected outright
/// - The joined, cleaned result must stay under the root, checked both by
///   prefix and by the relative path back to the root
/// - Never partially resolves: a violation is an error, not a clamped path
#[derive(Debug, Clone)]
pub struct PathSanitizer {
    /// Absolute, clean space root
    root: PathBuf,
    /// Maximum allowed input length (default: 4096)
    max_path_len: usize,
}

impl PathSanitizer {
    /// Create a sanitizer for `root`, resolving it to an absolute clean path
    pub fn new(root: impl AsRef<Path>) -> Result<Self, PathSanitizerError> {
        let root = root.as_ref();
        let absolute = std::path::absolute(root)
            .map_err(|e| PathSanitizerError::InvalidPath(format!("{}: {}", root.display(), e)))?;
        Ok(Self {
            root: clean_path(&absolute),
            max_path_len: 4096,
        })
    }

    /// Create a sanitizer with a custom max input length
    pub fn with_max_length(mut self, max_path_len: usize) -> Self {
        self.max_path_len = max_path_len;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a space-relative name to an absolute path under the root
    ///
    /// The name is NFD-normalized first.
    ///
    /// # Examples
    /// ```
    /// use notespace_core::domain::path_sanitizer::PathSanitizer;
    ///
    /// let sanitizer = PathSanitizer::new("/space").unwrap();
    /// let safe = sanitizer.safe_path("notes/./today.md").unwrap();
    /// assert!(safe.ends_with("notes/today.md"));
    ///
    /// assert!(sanitizer.safe_path("../etc/passwd").is_err());
    /// assert!(sanitizer.safe_path("/etc/passwd").is_err());
    /// ```
    pub fn safe_path(&self, path: &str) -> Result<PathBuf, PathSanitizerError> {
        if path.len() > self.max_path_len {
            return Err(PathSanitizerError::PathTooLong(path.to_string()));
        }
        if path.contains('\0') {
            return Err(PathSanitizerError::InvalidPath(path.to_string()));
        }

        let normalized = normalize_path(path);
        let cleaned = clean_path(Path::new(&normalized));
        if cleaned.has_root() || cleaned.is_absolute() {
            tracing::warn!(path = %path, "Rejected absolute path");
            return Err(PathSanitizerError::OutsideBoundary(path.to_string()));
        }

        let full = clean_path(&self.root.join(&cleaned));
        if !full.starts_with(&self.root) {
            tracing::warn!(path = %path, root = %self.root.display(), "Path escapes space root");
            return Err(PathSanitizerError::OutsideBoundary(path.to_string()));
        }

        // A prefix match alone is not enough, the way back must not climb
        let relative = full
            .strip_prefix(&self.root)
            .map_err(|_| PathSanitizerError::OutsideBoundary(path.to_string()))?;
        if matches!(relative.components().next(), Some(Component::ParentDir)) {
            tracing::warn!(path = %path, "Path escapes space root");
            return Err(PathSanitizerError::OutsideBoundary(path.to_string()));
        }

        Ok(full)
    }

    /// Convert an absolute path under the root back to a space name
    ///
    /// Always forward-slash separated and NFD-normalized.
    pub fn to_space_name(&self, full_path: &Path) -> String {
        let relative = full_path.strip_prefix(&self.root).unwrap_or(full_path);
        let joined = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        normalize_path(&joined)
    }
}
