// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Directory synthesis
//!
//! Directories are never stored. Consumers that need a hierarchy derive it
//! from the flat file list on every request, so there is no directory index
//! that could go stale.

use crate::domain::file_meta::FileMeta;
use std::collections::HashSet;

/// Direct children of `root` derived from a flat file list
///
/// Files directly under `root` are returned as-is. For deeper files the
/// first remaining path segment becomes a synthetic directory entry,
/// emitted once per distinct segment with timestamps borrowed from
/// whichever file under it came first. `root` is given without leading or
/// trailing slash; the empty string is the space root.
pub fn extract_direct_files_and_folders(files: &[FileMeta], root: &str) -> Vec<FileMeta> {
    let prefix = if root.is_empty() {
        String::new()
    } else {
        format!("{}/", root)
    };

    let mut children = Vec::new();
    let mut seen_directories: HashSet<&str> = HashSet::new();

    for file in files {
        let Some(relative) = file.name.strip_prefix(&prefix) else {
            continue;
        };

        match relative.split_once('/') {
            None => children.push(file.clone()),
            Some((dir_name, _)) => {
                if seen_directories.insert(dir_name) {
                    children.push(FileMeta::synthetic_directory(
                        format!("{}{}", prefix, dir_name),
                        file,
                    ));
                }
            }
        }
    }

    children
}
