// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Read-only fallthrough layer
//!
//! Overlays an immutable [`EmbeddedBundle`] subtree onto an optional
//! delegate backend. Reads hit the bundle first; anything the bundle does
//! not hold falls through to the delegate. Bundle files are served with
//! `perm = "ro"` and one fixed timestamp for the whole tree, and can never
//! be overwritten or deleted through this layer.
//!
//! Listings are the plain concatenation of both layers. A name present in
//! the bundle and in the delegate is reported twice.

use crate::domain::file_meta::{lookup_content_type, FileMeta, Permission};
use crate::domain::space_primitives::{SpaceError, SpacePrimitives};
use crate::infrastructure::storage::bundle::{bundle_key, EmbeddedBundle};
use async_trait::async_trait;
use std::sync::Arc;

pub struct ReadOnlyFallthroughSpacePrimitives {
    bundle: Arc<EmbeddedBundle>,
    root: String,
    timestamp: i64,
    delegate: Option<Arc<dyn SpacePrimitives>>,
}

impl ReadOnlyFallthroughSpacePrimitives {
    /// Serve the bundle subtree at `root`, stamped with `timestamp` (ms)
    pub fn new(
        bundle: Arc<EmbeddedBundle>,
        root: impl Into<String>,
        timestamp: i64,
        delegate: Option<Arc<dyn SpacePrimitives>>,
    ) -> Self {
        Self {
            bundle,
            root: root.into().trim_matches('/').to_string(),
            timestamp,
            delegate,
        }
    }

    fn bundled(&self, path: &str) -> Option<(String, &[u8])> {
        let key = bundle_key(&self.root, path)?;
        let data = self.bundle.get(&key)?;
        let name = match key.strip_prefix(&self.root) {
            Some(rest) if !self.root.is_empty() => rest.trim_start_matches('/').to_string(),
            _ => key,
        };
        Some((name, data))
    }

    fn bundle_meta(&self, name: String, size: usize) -> FileMeta {
        FileMeta {
            content_type: lookup_content_type(&name),
            name,
            created: self.timestamp,
            last_modified: self.timestamp,
            size: size as u64,
            perm: Permission::ReadOnly,
        }
    }

    fn delegate(&self) -> Option<&dyn SpacePrimitives> {
        self.delegate.as_deref()
    }

    fn refuse_bundled(&self, path: &str) -> Result<(), SpaceError> {
        if self.bundled(path).is_some() {
            return Err(SpaceError::NotAllowed(format!(
                "{} is part of the read-only bundle",
                path
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SpacePrimitives for ReadOnlyFallthroughSpacePrimitives {
    async fn fetch_file_list(&self) -> Result<Vec<FileMeta>, SpaceError> {
        let mut files: Vec<FileMeta> = self
            .bundle
            .files_under(&self.root)
            .map(|(name, data)| self.bundle_meta(name.to_string(), data.len()))
            .collect();

        if let Some(delegate) = self.delegate() {
            files.extend(delegate.fetch_file_list().await?);
        }
        Ok(files)
    }

    async fn get_file_meta(&self, path: &str) -> Result<FileMeta, SpaceError> {
        if let Some((name, data)) = self.bundled(path) {
            return Ok(self.bundle_meta(name, data.len()));
        }
        match self.delegate() {
            Some(delegate) => delegate.get_file_meta(path).await,
            None => Err(SpaceError::NotFound(path.to_string())),
        }
    }

    async fn read_file(&self, path: &str) -> Result<(Vec<u8>, FileMeta), SpaceError> {
        if let Some((name, data)) = self.bundled(path) {
            let meta = self.bundle_meta(name, data.len());
            return Ok((data.to_vec(), meta));
        }
        match self.delegate() {
            Some(delegate) => delegate.read_file(path).await,
            None => Err(SpaceError::NotFound(path.to_string())),
        }
    }

    async fn write_file(
        &self,
        path: &str,
        data: &[u8],
        meta: Option<&FileMeta>,
    ) -> Result<FileMeta, SpaceError> {
        self.refuse_bundled(path)?;
        match self.delegate() {
            Some(delegate) => delegate.write_file(path, data, meta).await,
            None => Err(SpaceError::NotAllowed(path.to_string())),
        }
    }

    async fn delete_file(&self, path: &str) -> Result<(), SpaceError> {
        self.refuse_bundled(path)?;
        match self.delegate() {
            Some(delegate) => delegate.delete_file(path).await,
            None => Err(SpaceError::NotAllowed(path.to_string())),
        }
    }

    async fn create_directory(&self, path: &str) -> Result<(), SpaceError> {
        match self.delegate() {
            Some(delegate) => delegate.create_directory(path).await,
            None => Err(SpaceError::NotAllowed(path.to_string())),
        }
    }

    async fn is_directory(&self, path: &str) -> bool {
        if let Some(delegate) = self.delegate() {
            if delegate.is_directory(path).await {
                return true;
            }
        }
        // Bundle-only folders still need to be browsable
        bundle_key(&self.root, path).is_some_and(|key| self.bundle.is_dir(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::memory::InMemorySpacePrimitives;

    const ENTRIES: &[(&str, &[u8])] = &[
        ("base_fs/Library/std.md", b"# std"),
        ("base_fs/plug.js", b"export {}"),
        ("client/index.html", b"<html>"),
    ];

    fn layer(delegate: Option<Arc<dyn SpacePrimitives>>) -> ReadOnlyFallthroughSpacePrimitives {
        ReadOnlyFallthroughSpacePrimitives::new(
            Arc::new(EmbeddedBundle::from_static(ENTRIES)),
            "base_fs",
            1_700_000_000_000,
            delegate,
        )
    }

    #[tokio::test]
    async fn test_bundle_files_are_read_only_with_fixed_timestamp() {
        let fs = layer(None);
        let (data, meta) = fs.read_file("plug.js").await.unwrap();
        assert_eq!(data, b"export {}");
        assert_eq!(meta.name, "plug.js");
        assert_eq!(meta.perm, Permission::ReadOnly);
        assert_eq!(meta.last_modified, 1_700_000_000_000);
        assert_eq!(meta.created, 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_bundle_root_is_not_escapable() {
        let fs = layer(None);
        assert!(fs
            .read_file("../client/index.html")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_write_over_bundle_refused_even_with_delegate() {
        let memory: Arc<dyn SpacePrimitives> = Arc::new(InMemorySpacePrimitives::new());
        let fs = layer(Some(memory.clone()));

        assert!(matches!(
            fs.write_file("plug.js", b"x", None).await,
            Err(SpaceError::NotAllowed(_))
        ));
        assert!(matches!(
            fs.delete_file("Library/std.md").await,
            Err(SpaceError::NotAllowed(_))
        ));
        assert!(memory.get_file_meta("plug.js").await.is_err());

        fs.write_file("mine.md", b"ok", None).await.unwrap();
        assert_eq!(memory.read_file("mine.md").await.unwrap().0, b"ok");
    }

    #[tokio::test]
    async fn test_listing_concatenates_layers() {
        let memory: Arc<dyn SpacePrimitives> = Arc::new(InMemorySpacePrimitives::new());
        memory.write_file("plug.js", b"shadow", None).await.unwrap();
        let fs = layer(Some(memory));

        let files = fs.fetch_file_list().await.unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files.iter().filter(|f| f.name == "plug.js").count(), 2);
    }

    #[tokio::test]
    async fn test_without_delegate() {
        let fs = layer(None);
        assert!(fs.get_file_meta("missing.md").await.unwrap_err().is_not_found());
        assert!(matches!(
            fs.write_file("new.md", b"x", None).await,
            Err(SpaceError::NotAllowed(_))
        ));
        assert!(matches!(
            fs.create_directory("dir").await,
            Err(SpaceError::NotAllowed(_))
        ));
        assert!(fs.is_directory("Library").await);
        assert!(!fs.is_directory("plug.js").await);
    }
}
