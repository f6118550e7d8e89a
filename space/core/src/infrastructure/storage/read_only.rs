// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Read-only policy wrapper
//!
//! Forces any backend into read-only mode: reads pass through untouched,
//! every mutation fails with `NotAllowed` without reaching the wrapped
//! backend.

use crate::domain::file_meta::FileMeta;
use crate::domain::space_primitives::{SpaceError, SpacePrimitives};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct ReadOnlySpacePrimitives {
    inner: Arc<dyn SpacePrimitives>,
}

impl ReadOnlySpacePrimitives {
    pub fn new(inner: Arc<dyn SpacePrimitives>) -> Self {
        Self { inner }
    }

    fn refuse(operation: &str, path: &str) -> SpaceError {
        debug!(operation, path = %path, "Refusing mutation in read-only mode");
        SpaceError::NotAllowed(format!("{} {}: space is read-only", operation, path))
    }
}

#[async_trait]
impl SpacePrimitives for ReadOnlySpacePrimitives {
    async fn fetch_file_list(&self) -> Result<Vec<FileMeta>, SpaceError> {
        self.inner.fetch_file_list().await
    }

    async fn get_file_meta(&self, path: &str) -> Result<FileMeta, SpaceError> {
        self.inner.get_file_meta(path).await
    }

    async fn read_file(&self, path: &str) -> Result<(Vec<u8>, FileMeta), SpaceError> {
        self.inner.read_file(path).await
    }

    async fn write_file(
        &self,
        path: &str,
        _data: &[u8],
        _meta: Option<&FileMeta>,
    ) -> Result<FileMeta, SpaceError> {
        Err(Self::refuse("write", path))
    }

    async fn delete_file(&self, path: &str) -> Result<(), SpaceError> {
        Err(Self::refuse("delete", path))
    }

    async fn create_directory(&self, path: &str) -> Result<(), SpaceError> {
        Err(Self::refuse("mkdir", path))
    }

    async fn is_directory(&self, path: &str) -> bool {
        self.inner.is_directory(path).await
    }
}
