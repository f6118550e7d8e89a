// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP server bootstrap
//!
//! Wires configuration, the space storage chain and the router together,
//! then serves until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use notespace_core::{
    application::{build_space_stack, disk_backend, ensure_index_and_config, BundleAssets},
    domain::{
        metrics::{NoopMetrics, SpaceMetrics},
        server_config::ServerConfig,
    },
    infrastructure::metrics::{install_prometheus_exporter, PrometheusMetrics},
    presentation::api::{app, AppState, BootConfig},
};

/// Build the router for `config`, seeding the space when it is writable
pub async fn build_app(
    config: &ServerConfig,
    assets: &BundleAssets,
    metrics: Arc<dyn SpaceMetrics>,
) -> Result<Router> {
    let stack = build_space_stack(
        disk_backend(&config.space),
        &config.space,
        assets,
        metrics.clone(),
    )?;

    if !config.space.read_only {
        ensure_index_and_config(stack.space.as_ref(), &config.space.index_page, &assets.templates)
            .await?;
    }

    let boot = BootConfig {
        space_folder_path: config.space.folder.display().to_string(),
        index_page: config.space.index_page.clone(),
        read_only: config.space.read_only,
    };
    let state = AppState::new(stack.space, stack.client_bundle, boot)
        .with_url_prefix(config.url_prefix.clone())
        .with_metrics(metrics);

    let router = app(state);
    Ok(if config.http_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    })
}

pub async fn run_server(config: ServerConfig, assets: BundleAssets) -> Result<()> {
    let metrics: Arc<dyn SpaceMetrics> = if config.metrics.enabled {
        let addr: SocketAddr = format!("{}:{}", config.bind_host, config.metrics.port)
            .parse()
            .context("Invalid metrics listen address")?;
        install_prometheus_exporter(addr)?;
        Arc::new(PrometheusMetrics)
    } else {
        Arc::new(NoopMetrics)
    };

    info!(folder = %config.space.folder.display(), "Serving space");
    let app = build_app(&config, &assets, metrics).await?;

    let addr = format!("{}:{}", config.bind_host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    if config.bind_host == "127.0.0.1" {
        warn!("Only available locally. Pass -L0.0.0.0 to allow outside connections, and put a TLS terminator in front.");
    }
    let visible_host = if config.bind_host == "127.0.0.1" {
        "localhost"
    } else {
        config.bind_host.as_str()
    };
    info!(
        "notespace is now running: http://{}:{}{}",
        visible_host, config.port, config.url_prefix
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Graceful shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
