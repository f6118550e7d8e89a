// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # notespace
//!
//! The `notespace` binary serves a folder of markdown files over HTTP and
//! WebDAV.
//!
//! ## Usage
//!
//! - `notespace [FOLDER]` - Serve a space (default mode)
//! - `notespace config show|validate|generate` - Configuration management
//!
//! Settings are layered: config file, then `NOTESPACE_*` environment
//! variables, then command line flags.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use notespace_core::domain::server_config::ServerConfig;
use notespace_server::{bundle, commands, server};

use commands::ConfigCommand;

/// notespace - Markdown note taking server
#[derive(Parser)]
#[command(name = "notespace")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "NOTESPACE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Host or address to listen on
    #[arg(short = 'L', long)]
    hostname: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "NOTESPACE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Folder to serve as the space
    #[arg(value_name = "FOLDER")]
    folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => serve(cli).await,
    }
}

async fn serve(cli: Cli) -> Result<()> {
    let mut config =
        ServerConfig::load_or_default(cli.config).context("Failed to load configuration")?;

    if let Some(folder) = cli.folder {
        config.space.folder = folder;
    }
    if let Some(hostname) = cli.hostname {
        config.bind_host = hostname;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    config.validate().context("Invalid configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        space = %config.space.name,
        "Starting notespace"
    );

    let assets = bundle::load_bundle_assets(config.bundle_dir.as_deref())?;
    server::run_server(config, assets).await
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
