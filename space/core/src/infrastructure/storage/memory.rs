// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory space storage for tests and ephemeral spaces

use crate::domain::file_meta::{lookup_content_type, FileMeta, Permission};
use crate::domain::space_primitives::{SpaceError, SpacePrimitives};
use crate::infrastructure::storage::bundle::bundle_key;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Default)]
struct MemoryState {
    files: BTreeMap<String, (Vec<u8>, FileMeta)>,
    directories: BTreeSet<String>,
}

impl MemoryState {
    fn has_children(&self, dir: &str) -> bool {
        let prefix = format!("{}/", dir);
        self.files.keys().any(|name| name.starts_with(&prefix))
            || self.directories.iter().any(|d| d.starts_with(&prefix))
    }
}

/// Volatile `SpacePrimitives` implementation
///
/// Names are normalized and confined the same way as on disk. Explicitly
/// created directories are remembered until a file below them is deleted
/// and leaves them empty.
#[derive(Default)]
pub struct InMemorySpacePrimitives {
    state: RwLock<MemoryState>,
}

impl InMemorySpacePrimitives {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(path: &str) -> Result<String, SpaceError> {
        bundle_key("", path).ok_or_else(|| SpaceError::PathOutsideRoot(path.to_string()))
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl SpacePrimitives for InMemorySpacePrimitives {
    async fn fetch_file_list(&self) -> Result<Vec<FileMeta>, SpaceError> {
        let state = self.state.read();
        Ok(state.files.values().map(|(_, meta)| meta.clone()).collect())
    }

    async fn get_file_meta(&self, path: &str) -> Result<FileMeta, SpaceError> {
        let key = Self::key(path)?;
        self.state
            .read()
            .files
            .get(&key)
            .map(|(_, meta)| meta.clone())
            .ok_or_else(|| SpaceError::NotFound(path.to_string()))
    }

    async fn read_file(&self, path: &str) -> Result<(Vec<u8>, FileMeta), SpaceError> {
        let key = Self::key(path)?;
        self.state
            .read()
            .files
            .get(&key)
            .cloned()
            .ok_or_else(|| SpaceError::NotFound(path.to_string()))
    }

    async fn write_file(
        &self,
        path: &str,
        data: &[u8],
        meta: Option<&FileMeta>,
    ) -> Result<FileMeta, SpaceError> {
        let key = Self::key(path)?;
        if key.is_empty() {
            return Err(SpaceError::CouldNotWrite(path.to_string()));
        }

        let mut state = self.state.write();
        if state.directories.contains(&key) || state.has_children(&key) {
            return Err(SpaceError::CouldNotWrite(format!("{} is a directory", path)));
        }

        let now = now_millis();
        let created = state
            .files
            .get(&key)
            .map(|(_, existing)| existing.created)
            .unwrap_or(now);
        let last_modified = meta
            .map(|m| m.last_modified)
            .filter(|&ts| ts > 0)
            .unwrap_or(now);

        let stored = FileMeta {
            name: key.clone(),
            created,
            last_modified,
            content_type: lookup_content_type(&key),
            size: data.len() as u64,
            perm: Permission::ReadWrite,
        };
        state.files.insert(key, (data.to_vec(), stored.clone()));
        Ok(stored)
    }

    async fn delete_file(&self, path: &str) -> Result<(), SpaceError> {
        let key = Self::key(path)?;
        let mut state = self.state.write();
        if state.files.remove(&key).is_none() {
            return Err(SpaceError::NotFound(path.to_string()));
        }

        // Prune parents left empty, like the disk backend does
        let mut parent = key.rsplit_once('/').map(|(dir, _)| dir.to_string());
        while let Some(dir) = parent {
            if state.has_children(&dir) {
                break;
            }
            state.directories.remove(&dir);
            parent = dir.rsplit_once('/').map(|(up, _)| up.to_string());
        }
        Ok(())
    }

    async fn create_directory(&self, path: &str) -> Result<(), SpaceError> {
        let key = Self::key(path)?;
        let mut state = self.state.write();
        if key.is_empty()
            || state.files.contains_key(&key)
            || state.directories.contains(&key)
            || state.has_children(&key)
        {
            return Err(SpaceError::AlreadyExists(path.to_string()));
        }
        state.directories.insert(key);
        Ok(())
    }

    async fn is_directory(&self, path: &str) -> bool {
        let Ok(key) = Self::key(path) else {
            return false;
        };
        if key.is_empty() {
            return true;
        }
        let state = self.state.read();
        state.directories.contains(&key) || state.has_children(&key)
    }
}
