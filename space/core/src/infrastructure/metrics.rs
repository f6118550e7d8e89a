// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Prometheus metrics sink
//!
//! Implements [`SpaceMetrics`] on top of the `metrics` facade. Nothing is
//! exported until [`install_prometheus_exporter`] has been called; before
//! that the macros are no-ops.

use crate::domain::metrics::SpaceMetrics;
use ::metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

pub const FILES_COUNT: &str = "space_files_count";
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";

#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMetrics;

impl SpaceMetrics for PrometheusMetrics {
    fn record_file_count(&self, count: usize) {
        gauge!(FILES_COUNT).set(count as f64);
    }

    fn record_request(&self, method: &str, status: u16) {
        counter!(
            HTTP_REQUESTS_TOTAL,
            "method" => method.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
    }
}

/// Start the Prometheus scrape endpoint on `addr`
///
/// Must be called from within a Tokio runtime.
pub fn install_prometheus_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;
    info!(%addr, "Prometheus metrics exporter listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_harmless() {
        let metrics = PrometheusMetrics;
        metrics.record_file_count(3);
        metrics.record_request("PROPFIND", 207);
    }
}
