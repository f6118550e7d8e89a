// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Behaviour every `SpacePrimitives` implementation must share

#![allow(dead_code)]

use notespace_core::domain::file_meta::{FileMeta, Permission};
use notespace_core::{SpaceError, SpacePrimitives};

pub const NFC_NAME: &str = "\u{00E9}t\u{00E9}.md";
pub const NFD_NAME: &str = "e\u{0301}te\u{0301}.md";

fn hint(last_modified: i64) -> FileMeta {
    FileMeta {
        name: String::new(),
        created: 0,
        last_modified,
        content_type: String::new(),
        size: 0,
        perm: Permission::ReadWrite,
    }
}

fn listed<'a>(files: &'a [FileMeta], name: &str) -> Option<&'a FileMeta> {
    files.iter().find(|f| f.name == name)
}

/// Exercise the full contract against an empty (writable) space
///
/// Layers that add their own files to listings are fine: assertions only
/// look at names the suite wrote itself.
pub async fn run_conformance(space: &dyn SpacePrimitives) {
    // Write, stat, read
    let written = space
        .write_file("test.md", b"Hello World", Some(&hint(1_650_000_000_000)))
        .await
        .unwrap();
    assert_eq!(written.name, "test.md");
    assert_eq!(written.size, 11);
    assert_eq!(written.last_modified, 1_650_000_000_000);
    assert_eq!(written.content_type, "text/markdown");
    assert_eq!(written.perm, Permission::ReadWrite);

    let meta = space.get_file_meta("test.md").await.unwrap();
    assert_eq!(meta.size, 11);
    assert_eq!(meta.last_modified, 1_650_000_000_000);

    let (data, meta) = space.read_file("test.md").await.unwrap();
    assert_eq!(data, b"Hello World");
    assert_eq!(meta.name, "test.md");

    let files = space.fetch_file_list().await.unwrap();
    assert_eq!(listed(&files, "test.md").map(|f| f.size), Some(11));

    // Overwrite
    let rewritten = space.write_file("test.md", b"Hi", None).await.unwrap();
    assert_eq!(rewritten.size, 2);
    let (data, _) = space.read_file("test.md").await.unwrap();
    assert_eq!(data, b"Hi");

    // Binary content survives untouched
    let binary: Vec<u8> = (0..=255u8).collect();
    space.write_file("data.bin", &binary, None).await.unwrap();
    let (data, meta) = space.read_file("data.bin").await.unwrap();
    assert_eq!(data, binary);
    assert_eq!(meta.content_type, "application/octet-stream");

    // Nested writes create their directories
    space
        .write_file("folder/sub/page.md", b"nested", None)
        .await
        .unwrap();
    assert!(space.is_directory("folder").await);
    assert!(space.is_directory("folder/sub").await);
    assert!(!space.is_directory("test.md").await);
    assert!(!space.is_directory("missing").await);

    let files = space.fetch_file_list().await.unwrap();
    assert!(listed(&files, "folder/sub/page.md").is_some());
    assert!(listed(&files, "folder").is_none());

    // Deleting the only file prunes its directories
    space.delete_file("folder/sub/page.md").await.unwrap();
    assert!(space
        .get_file_meta("folder/sub/page.md")
        .await
        .unwrap_err()
        .is_not_found());
    assert!(!space.is_directory("folder/sub").await);
    assert!(!space.is_directory("folder").await);

    // Explicit directories
    space.create_directory("made").await.unwrap();
    assert!(space.is_directory("made").await);
    assert!(matches!(
        space.create_directory("made").await,
        Err(SpaceError::AlreadyExists(_))
    ));

    // Composed and decomposed spellings address the same file
    space.write_file(NFC_NAME, b"unicode", None).await.unwrap();
    let (data, meta) = space.read_file(NFD_NAME).await.unwrap();
    assert_eq!(data, b"unicode");
    assert_eq!(meta.name, NFD_NAME);
    let files = space.fetch_file_list().await.unwrap();
    assert!(listed(&files, NFD_NAME).is_some());
    space.delete_file(NFC_NAME).await.unwrap();
    assert!(space.get_file_meta(NFD_NAME).await.is_err());

    // Missing files
    assert!(space.read_file("nope.md").await.unwrap_err().is_not_found());
    assert!(space.get_file_meta("nope.md").await.unwrap_err().is_not_found());
    assert!(space.delete_file("nope.md").await.unwrap_err().is_not_found());

    // Nothing escapes the space
    assert!(space.write_file("../outside.md", b"x", None).await.is_err());
    assert!(space.read_file("../outside.md").await.is_err());
    assert!(!space.is_directory("..").await);

    // Cleanup
    space.delete_file("test.md").await.unwrap();
    space.delete_file("data.bin").await.unwrap();
    assert!(space.delete_file("test.md").await.unwrap_err().is_not_found());

    let files = space.fetch_file_list().await.unwrap();
    assert!(listed(&files, "test.md").is_none());
    assert!(listed(&files, "data.bin").is_none());
}
