// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Space Bootstrap Application Service
//!
//! Assembles the `SpacePrimitives` chain served for a space and seeds it:
//!
//! ```text
//! ReadOnlyFallthrough(bundle "base_fs") -> [ReadOnly] -> Disk
//! ```
//!
//! plus a delegate-less fallthrough over the bundle's "client" subtree that
//! serves the web client. Follows the factory-then-wire pattern of the other
//! application services: infrastructure is created through
//! `create_space_primitives`, composition happens here.

use crate::domain::metrics::SpaceMetrics;
use crate::domain::server_config::SpaceConfig;
use crate::domain::space_primitives::{SpaceError, SpacePrimitives};
use crate::infrastructure::storage::{
    create_space_primitives, EmbeddedBundle, ReadOnlyFallthroughSpacePrimitives,
    ReadOnlySpacePrimitives, StorageBackend,
};
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::info;

/// Bundle subtree overlaid onto the user's space
pub const BASE_FS_ROOT: &str = "base_fs";

/// Bundle subtree holding the web client
pub const CLIENT_ROOT: &str = "client";

/// Name of the configuration page seeded into new spaces
pub const CONFIG_PAGE: &str = "CONFIG.md";

/// Compiled-in content of the pages seeded into an empty space
#[derive(Debug, Clone, Default)]
pub struct SpaceTemplates {
    pub index_page: Cow<'static, [u8]>,
    pub config_page: Cow<'static, [u8]>,
}

/// Embedded assets shared by every layer
#[derive(Debug, Clone)]
pub struct BundleAssets {
    pub bundle: Arc<EmbeddedBundle>,
    /// Fixed timestamp (ms) reported for every bundled file
    pub timestamp: i64,
    pub templates: SpaceTemplates,
}

/// The storage stacks a running server needs
pub struct SpaceStack {
    /// User space overlaid with the base filesystem bundle
    pub space: Arc<dyn SpacePrimitives>,
    /// Web client assets, read-only
    pub client_bundle: Arc<dyn SpacePrimitives>,
}

/// Build the space chain on top of `backend`
pub fn build_space_stack(
    backend: StorageBackend,
    config: &SpaceConfig,
    assets: &BundleAssets,
    metrics: Arc<dyn SpaceMetrics>,
) -> Result<SpaceStack> {
    let mut base = create_space_primitives(backend, metrics)
        .context("Failed to open space storage")?;

    if config.read_only {
        info!("Space is in read-only mode");
        base = Arc::new(ReadOnlySpacePrimitives::new(base));
    }

    let space: Arc<dyn SpacePrimitives> = Arc::new(ReadOnlyFallthroughSpacePrimitives::new(
        assets.bundle.clone(),
        BASE_FS_ROOT,
        assets.timestamp,
        Some(base),
    ));
    let client_bundle: Arc<dyn SpacePrimitives> = Arc::new(ReadOnlyFallthroughSpacePrimitives::new(
        assets.bundle.clone(),
        CLIENT_ROOT,
        assets.timestamp,
        None,
    ));

    Ok(SpaceStack {
        space,
        client_bundle,
    })
}

/// Disk backend described by `config`
pub fn disk_backend(config: &SpaceConfig) -> StorageBackend {
    StorageBackend::Disk {
        folder: config.folder.clone(),
        ignore: config.ignore.clone(),
        walk_threads: config.walk_threads,
    }
}

/// Write the index and config pages when they do not exist yet
///
/// Only a `NotFound` stat triggers a write; any other failure is left for
/// the first request to surface.
pub async fn ensure_index_and_config(
    space: &dyn SpacePrimitives,
    index_page: &str,
    templates: &SpaceTemplates,
) -> Result<()> {
    let index_path = format!("{}.md", index_page);
    seed_page(space, &index_path, &templates.index_page).await?;
    seed_page(space, CONFIG_PAGE, &templates.config_page).await?;
    Ok(())
}

async fn seed_page(space: &dyn SpacePrimitives, path: &str, content: &[u8]) -> Result<()> {
    if let Err(SpaceError::NotFound(_)) = space.get_file_meta(path).await {
        info!(page = %path, "Page does not yet exist, creating");
        space
            .write_file(path, content, None)
            .await
            .with_context(|| format!("Could not write page {}", path))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::file_meta::Permission;
    use crate::domain::metrics::NoopMetrics;
    use tempfile::TempDir;

    const ENTRIES: &[(&str, &[u8])] = &[
        ("base_fs/Library/std.md", b"# Standard library"),
        ("client/index.html", b"<html></html>"),
    ];

    fn assets() -> BundleAssets {
        BundleAssets {
            bundle: Arc::new(EmbeddedBundle::from_static(ENTRIES)),
            timestamp: 1_000,
            templates: SpaceTemplates {
                index_page: Cow::Borrowed(&b"# Hello"[..]),
                config_page: Cow::Borrowed(&b"# Config"[..]),
            },
        }
    }

    #[tokio::test]
    async fn test_stack_overlays_bundle_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let config = SpaceConfig {
            folder: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let stack = build_space_stack(
            disk_backend(&config),
            &config,
            &assets(),
            Arc::new(NoopMetrics),
        )
        .unwrap();

        let meta = stack.space.get_file_meta("Library/std.md").await.unwrap();
        assert_eq!(meta.perm, Permission::ReadOnly);

        stack.space.write_file("mine.md", b"x", None).await.unwrap();
        assert!(temp_dir.path().join("mine.md").is_file());

        let (html, _) = stack.client_bundle.read_file("index.html").await.unwrap();
        assert_eq!(html, b"<html></html>");
        assert!(stack.client_bundle.read_file("mine.md").await.is_err());
    }

    #[tokio::test]
    async fn test_seeding_writes_missing_pages_only() {
        let temp_dir = TempDir::new().unwrap();
        let config = SpaceConfig {
            folder: temp_dir.path().to_path_buf(),
            index_page: "home".to_string(),
            ..Default::default()
        };
        std::fs::write(temp_dir.path().join("CONFIG.md"), b"mine").unwrap();

        let stack = build_space_stack(
            disk_backend(&config),
            &config,
            &assets(),
            Arc::new(NoopMetrics),
        )
        .unwrap();
        ensure_index_and_config(stack.space.as_ref(), &config.index_page, &assets().templates)
            .await
            .unwrap();

        assert_eq!(std::fs::read(temp_dir.path().join("home.md")).unwrap(), b"# Hello");
        assert_eq!(std::fs::read(temp_dir.path().join("CONFIG.md")).unwrap(), b"mine");
    }

    #[tokio::test]
    async fn test_read_only_stack_refuses_seeding() {
        let temp_dir = TempDir::new().unwrap();
        let config = SpaceConfig {
            folder: temp_dir.path().to_path_buf(),
            read_only: true,
            ..Default::default()
        };
        let stack = build_space_stack(
            disk_backend(&config),
            &config,
            &assets(),
            Arc::new(NoopMetrics),
        )
        .unwrap();

        assert!(stack.space.write_file("a.md", b"x", None).await.is_err());
        assert!(
            ensure_index_and_config(stack.space.as_ref(), "index", &assets().templates)
                .await
                .is_err()
        );
    }
}
