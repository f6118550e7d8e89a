// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Storage Infrastructure Module
//!
//! Concrete implementations of the `SpacePrimitives` trait and the layers
//! that compose them.

pub mod bundle;
pub mod disk;
pub mod fallthrough;
pub mod gitignore;
pub mod memory;
pub mod read_only;
pub mod walker;

pub use bundle::EmbeddedBundle;
pub use disk::DiskSpacePrimitives;
pub use fallthrough::ReadOnlyFallthroughSpacePrimitives;
pub use memory::InMemorySpacePrimitives;
pub use read_only::ReadOnlySpacePrimitives;

use crate::domain::metrics::SpaceMetrics;
use crate::domain::space_primitives::{SpaceError, SpacePrimitives};
use std::path::PathBuf;
use std::sync::Arc;

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// A folder on the local filesystem
    Disk {
        folder: PathBuf,
        ignore: String,
        walk_threads: usize,
    },

    /// Volatile storage, lost on exit
    Memory,
}

/// Factory function to create the base backend of a space
pub fn create_space_primitives(
    backend: StorageBackend,
    metrics: Arc<dyn SpaceMetrics>,
) -> Result<Arc<dyn SpacePrimitives>, SpaceError> {
    match backend {
        StorageBackend::Disk {
            folder,
            ignore,
            walk_threads,
        } => Ok(Arc::new(
            DiskSpacePrimitives::new(folder, walk_threads)?
                .with_ignore(&ignore)
                .with_metrics(metrics),
        )),
        StorageBackend::Memory => Ok(Arc::new(InMemorySpacePrimitives::new())),
    }
}
