// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the `SpacePrimitives` backends
//!
//! These tests verify:
//! 1. Every backend passes the shared conformance suite
//! 2. Disk specifics: hidden files, extensionless files, ignore rules,
//!    orphan pruning, symlink cycles, root confinement
//! 3. Layering: read-only wrapper and bundle fallthrough over disk

mod common;

use notespace_core::domain::file_meta::Permission;
use notespace_core::domain::metrics::SpaceMetrics;
use notespace_core::infrastructure::storage::{
    DiskSpacePrimitives, EmbeddedBundle, InMemorySpacePrimitives,
    ReadOnlyFallthroughSpacePrimitives, ReadOnlySpacePrimitives,
};
use notespace_core::{SpaceError, SpacePrimitives};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const BUNDLE: &[(&str, &[u8])] = &[
    ("base_fs/Library/Std/Library.md", b"# Library"),
    ("base_fs/SETTINGS.md", b"settings"),
];

fn disk(temp_dir: &TempDir) -> DiskSpacePrimitives {
    DiskSpacePrimitives::new(temp_dir.path(), 4).unwrap()
}

fn overlay(delegate: Arc<dyn SpacePrimitives>) -> ReadOnlyFallthroughSpacePrimitives {
    ReadOnlyFallthroughSpacePrimitives::new(
        Arc::new(EmbeddedBundle::from_static(BUNDLE)),
        "base_fs",
        1_700_000_000_000,
        Some(delegate),
    )
}

fn names(files: &[notespace_core::FileMeta]) -> Vec<String> {
    let mut names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_disk_conformance() {
    let temp_dir = TempDir::new().unwrap();
    common::run_conformance(&disk(&temp_dir)).await;
}

#[tokio::test]
async fn test_memory_conformance() {
    common::run_conformance(&InMemorySpacePrimitives::new()).await;
}

#[tokio::test]
async fn test_fallthrough_over_memory_conformance() {
    common::run_conformance(&overlay(Arc::new(InMemorySpacePrimitives::new()))).await;
}

#[tokio::test]
async fn test_fallthrough_over_disk_conformance() {
    let temp_dir = TempDir::new().unwrap();
    common::run_conformance(&overlay(Arc::new(disk(&temp_dir)))).await;
}

#[tokio::test]
async fn test_disk_skips_hidden_entries() {
    let temp_dir = TempDir::new().unwrap();
    let space = disk(&temp_dir);
    fs::write(temp_dir.path().join("visible.md"), "v").unwrap();
    fs::write(temp_dir.path().join(".hidden.md"), "h").unwrap();
    fs::create_dir_all(temp_dir.path().join(".git/objects")).unwrap();
    fs::write(temp_dir.path().join(".git/objects/pack.md"), "p").unwrap();

    let files = space.fetch_file_list().await.unwrap();
    assert_eq!(names(&files), vec!["visible.md"]);
}

#[tokio::test]
async fn test_disk_lists_only_files_with_extension() {
    let temp_dir = TempDir::new().unwrap();
    let space = disk(&temp_dir);
    fs::write(temp_dir.path().join("README"), "no extension").unwrap();
    fs::write(temp_dir.path().join("notes.md"), "n").unwrap();

    let files = space.fetch_file_list().await.unwrap();
    assert_eq!(names(&files), vec!["notes.md"]);

    // Still addressable directly
    let meta = space.get_file_meta("README").await.unwrap();
    assert_eq!(meta.size, 12);
    assert_eq!(meta.content_type, "application/octet-stream");
}

#[tokio::test]
async fn test_disk_ignore_rules_filter_listing() {
    let temp_dir = TempDir::new().unwrap();
    let space = DiskSpacePrimitives::new(temp_dir.path(), 2)
        .unwrap()
        .with_ignore("*.tmp\nnode_modules/\n# comment\n!keep.tmp");

    for name in [
        "a.md",
        "scratch.tmp",
        "keep.tmp",
        "deep/inner.tmp",
        "node_modules/pkg/index.js",
        "src/node_modules.md",
    ] {
        space.write_file(name, b"x", None).await.unwrap();
    }

    let files = space.fetch_file_list().await.unwrap();
    assert_eq!(
        names(&files),
        vec!["a.md", "keep.tmp", "src/node_modules.md"]
    );

    // Ignored files remain readable
    assert!(space.read_file("scratch.tmp").await.is_ok());
}

#[tokio::test]
async fn test_disk_delete_prunes_orphans_but_keeps_root_and_siblings() {
    let temp_dir = TempDir::new().unwrap();
    let space = disk(&temp_dir);
    space.write_file("a/b/c/deep.md", b"x", None).await.unwrap();
    space.write_file("a/sibling.md", b"x", None).await.unwrap();

    space.delete_file("a/b/c/deep.md").await.unwrap();
    assert!(!temp_dir.path().join("a/b").exists());
    assert!(temp_dir.path().join("a").is_dir());

    space.delete_file("a/sibling.md").await.unwrap();
    assert!(!temp_dir.path().join("a").exists());
    assert!(temp_dir.path().is_dir());
}

#[tokio::test]
async fn test_disk_rejects_paths_outside_root() {
    let temp_dir = TempDir::new().unwrap();
    let space = DiskSpacePrimitives::new(temp_dir.path().join("space"), 2).unwrap();

    let err = space
        .write_file("../escape.md", b"x", None)
        .await
        .unwrap_err();
    assert!(matches!(err, SpaceError::PathOutsideRoot(_)));
    assert!(!temp_dir.path().join("escape.md").exists());

    assert!(matches!(
        space.get_file_meta("/etc/passwd").await,
        Err(SpaceError::PathOutsideRoot(_))
    ));
    assert!(matches!(
        space.delete_file("notes/../../escape.md").await,
        Err(SpaceError::PathOutsideRoot(_))
    ));
}

#[tokio::test]
async fn test_disk_directories_are_not_files() {
    let temp_dir = TempDir::new().unwrap();
    let space = disk(&temp_dir);
    fs::create_dir(temp_dir.path().join("folder.md")).unwrap();

    assert!(space.get_file_meta("folder.md").await.unwrap_err().is_not_found());
    assert!(space.read_file("folder.md").await.unwrap_err().is_not_found());
    assert!(space.is_directory("folder.md").await);
    assert!(space.fetch_file_list().await.unwrap().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_disk_listing_survives_symlink_cycle() {
    let temp_dir = TempDir::new().unwrap();
    let space = disk(&temp_dir);
    fs::create_dir_all(temp_dir.path().join("a/b")).unwrap();
    fs::write(temp_dir.path().join("a/b/note.md"), "n").unwrap();
    std::os::unix::fs::symlink(temp_dir.path().join("a"), temp_dir.path().join("a/b/loop"))
        .unwrap();

    let files = space.fetch_file_list().await.unwrap();
    assert!(names(&files).contains(&"a/b/note.md".to_string()));
    assert!(files.len() <= 2);
}

#[tokio::test]
async fn test_disk_reports_file_count() {
    struct Counting(AtomicUsize);
    impl SpaceMetrics for Counting {
        fn record_file_count(&self, count: usize) {
            self.0.store(count, Ordering::SeqCst);
        }
        fn record_request(&self, _method: &str, _status: u16) {}
    }

    let temp_dir = TempDir::new().unwrap();
    let metrics = Arc::new(Counting(AtomicUsize::new(0)));
    let space = disk(&temp_dir).with_metrics(metrics.clone());
    space.write_file("one.md", b"1", None).await.unwrap();
    space.write_file("two/three.md", b"3", None).await.unwrap();

    space.fetch_file_list().await.unwrap();
    assert_eq!(metrics.0.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_read_only_over_disk() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("existing.md"), "content").unwrap();
    let space = ReadOnlySpacePrimitives::new(Arc::new(disk(&temp_dir)));

    let (data, _) = space.read_file("existing.md").await.unwrap();
    assert_eq!(data, b"content");
    assert_eq!(space.fetch_file_list().await.unwrap().len(), 1);

    assert!(matches!(
        space.write_file("new.md", b"x", None).await,
        Err(SpaceError::NotAllowed(_))
    ));
    assert!(matches!(
        space.delete_file("existing.md").await,
        Err(SpaceError::NotAllowed(_))
    ));
    assert!(matches!(
        space.create_directory("dir").await,
        Err(SpaceError::NotAllowed(_))
    ));
    assert!(temp_dir.path().join("existing.md").exists());
    assert!(!temp_dir.path().join("new.md").exists());
}

#[tokio::test]
async fn test_bundle_shadows_disk_and_stays_immutable() {
    let temp_dir = TempDir::new().unwrap();
    let space = overlay(Arc::new(disk(&temp_dir)));
    fs::write(temp_dir.path().join("SETTINGS.md"), "on disk").unwrap();

    let (data, meta) = space.read_file("SETTINGS.md").await.unwrap();
    assert_eq!(data, b"settings");
    assert_eq!(meta.perm, Permission::ReadOnly);
    assert_eq!(meta.last_modified, 1_700_000_000_000);

    assert!(matches!(
        space.write_file("SETTINGS.md", b"x", None).await,
        Err(SpaceError::NotAllowed(_))
    ));
    assert!(matches!(
        space.delete_file("Library/Std/Library.md").await,
        Err(SpaceError::NotAllowed(_))
    ));
    assert_eq!(fs::read(temp_dir.path().join("SETTINGS.md")).unwrap(), b"on disk");

    // Both layers are listed, the shadowed name twice
    let listed = names(&space.fetch_file_list().await.unwrap());
    assert_eq!(
        listed,
        vec!["Library/Std/Library.md", "SETTINGS.md", "SETTINGS.md"]
    );

    assert!(space.is_directory("Library").await);
    assert!(space.is_directory("Library/Std").await);
    assert!(!temp_dir.path().join("Library").exists());
}
