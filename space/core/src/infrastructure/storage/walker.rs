// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Concurrent space walker
//!
//! Walks a directory tree on a dedicated rayon pool, following symlinks.
//! Dot-prefixed entries are skipped, and a dot-prefixed directory prunes
//! its whole subtree. Every directory is identified by (device, inode), and
//! a symlink is not followed into a directory already on its own ancestor
//! chain, so circular symlinks cannot keep the walk alive. A symlink that
//! aliases a directory elsewhere in the tree is walked, and its files are
//! listed under both paths.

use parking_lot::Mutex;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(unix)]
type DirectoryId = (u64, u64);
#[cfg(not(unix))]
type DirectoryId = PathBuf;

#[cfg(unix)]
fn directory_id(_path: &Path, metadata: &Metadata) -> Option<DirectoryId> {
    use std::os::unix::fs::MetadataExt;
    Some((metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn directory_id(path: &Path, _metadata: &Metadata) -> Option<DirectoryId> {
    fs::canonicalize(path).ok()
}

struct WalkContext<T, F> {
    results: Mutex<Vec<T>>,
    visit: F,
}

/// Extends `ancestors` with the directory, or returns None when the
/// directory is one of its own ancestors
fn enter(
    ancestors: &[DirectoryId],
    path: &Path,
    metadata: &Metadata,
) -> Option<Vec<DirectoryId>> {
    let id = directory_id(path, metadata)?;
    if ancestors.contains(&id) {
        return None;
    }
    let mut chain = ancestors.to_vec();
    chain.push(id);
    Some(chain)
}

/// Walker with bounded parallelism
pub struct SpaceWalker {
    pool: rayon::ThreadPool,
}

impl SpaceWalker {
    pub fn new(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("space-walk-{}", i))
            .build()?;
        Ok(Self { pool })
    }

    /// Visit every non-hidden regular file below `root`
    ///
    /// `visit` receives the full path and the (symlink-followed) metadata and
    /// decides whether the file produces a result. Unreadable entries are
    /// skipped silently. Result order is unspecified.
    pub fn walk<T, F>(&self, root: &Path, visit: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Path, &Metadata) -> Option<T> + Sync,
    {
        let ctx = WalkContext {
            results: Mutex::new(Vec::new()),
            visit,
        };

        let chain = fs::metadata(root)
            .ok()
            .filter(Metadata::is_dir)
            .and_then(|metadata| enter(&[], root, &metadata));
        if let Some(chain) = chain {
            let ctx_ref = &ctx;
            let root = root.to_path_buf();
            self.pool
                .scope(move |scope| walk_directory(scope, root, chain, ctx_ref));
        }

        ctx.results.into_inner()
    }
}

fn walk_directory<'scope, T, F>(
    scope: &rayon::Scope<'scope>,
    dir: PathBuf,
    ancestors: Vec<DirectoryId>,
    ctx: &'scope WalkContext<T, F>,
) where
    T: Send,
    F: Fn(&Path, &Metadata) -> Option<T> + Sync,
{
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
            return;
        }
    };

    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        // fs::metadata follows symlinks
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };

        if metadata.is_dir() {
            match enter(&ancestors, &path, &metadata) {
                Some(chain) => {
                    scope.spawn(move |scope| walk_directory(scope, path, chain, ctx));
                }
                None => {
                    debug!(dir = %path.display(), "Symlink loops back to an ancestor, not following");
                }
            }
        } else if metadata.is_file() {
            if let Some(item) = (ctx.visit)(&path, &metadata) {
                ctx.results.lock().push(item);
            }
        }
    }
}
