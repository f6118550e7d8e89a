// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Embedded file bundle
//!
//! An immutable tree of files addressed by slash-separated names. The server
//! binary compiles its client assets and default space files into one of
//! these; tests and development builds can load one from a directory.

use crate::domain::path_sanitizer::{clean_path, normalize_path};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Component, Path};
use walkdir::WalkDir;

/// Immutable name to content map
#[derive(Debug, Clone, Default)]
pub struct EmbeddedBundle {
    files: BTreeMap<String, Cow<'static, [u8]>>,
}

impl EmbeddedBundle {
    /// Bundle over data compiled into the binary
    pub fn from_static(entries: &[(&'static str, &'static [u8])]) -> Self {
        let files = entries
            .iter()
            .map(|(name, data)| (normalize_path(name), Cow::Borrowed(*data)))
            .collect();
        Self { files }
    }

    /// Bundle holding a copy of every regular file below `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        let mut files = BTreeMap::new();
        for entry in WalkDir::new(dir).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(dir) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let data = std::fs::read(entry.path())?;
            files.insert(normalize_path(&name), Cow::Owned(data));
        }
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|data| data.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Whether some file lives below `name`
    pub fn is_dir(&self, name: &str) -> bool {
        if name.is_empty() {
            return !self.files.is_empty();
        }
        let prefix = format!("{}/", name);
        self.files
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(key, _)| key.starts_with(&prefix))
    }

    /// Files below `root`, yielded with names relative to it
    pub fn files_under<'a>(&'a self, root: &str) -> impl Iterator<Item = (&'a str, &'a [u8])> {
        let prefix = if root.is_empty() {
            String::new()
        } else {
            format!("{}/", root)
        };
        self.files.iter().filter_map(move |(name, data)| {
            name.strip_prefix(prefix.as_str())
                .map(|relative| (relative, data.as_ref()))
        })
    }
}

/// Join a space name onto a bundle root
///
/// Returns `None` when the cleaned name would climb out of the root, which
/// callers treat as "not in the bundle".
pub fn bundle_key(root: &str, name: &str) -> Option<String> {
    let normalized = normalize_path(name);
    let cleaned = clean_path(Path::new(&normalized));
    let mut parts = Vec::new();
    for component in cleaned.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            Component::CurDir => {}
            _ => return None,
        }
    }

    let relative = parts.join("/");
    Some(match (root.is_empty(), relative.is_empty()) {
        (true, _) => relative,
        (false, true) => root.to_string(),
        (false, false) => format!("{}/{}", root, relative),
    })
}

/// Timestamp for bundle content: the executable's modification time, or now
pub fn executable_timestamp() -> i64 {
    std::env::current_exe()
        .and_then(std::fs::metadata)
        .and_then(|m| m.modified())
        .ok()
        .map(|t| chrono::DateTime::<chrono::Utc>::from(t).timestamp_millis())
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis())
}
