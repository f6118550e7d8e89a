// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Metrics sink
//!
//! Storage and HTTP layers report through an injected sink instead of
//! process-wide registries, so both stay testable in isolation.

/// Receiver for space and request metrics
pub trait SpaceMetrics: Send + Sync {
    /// Number of files returned by the latest full listing
    fn record_file_count(&self, count: usize);

    /// One completed HTTP request
    fn record_request(&self, method: &str, status: u16);
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl SpaceMetrics for NoopMetrics {
    fn record_file_count(&self, _count: usize) {}

    fn record_request(&self, _method: &str, _status: u16) {}
}
