// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::bundle::SAMPLE_CONFIG;
use notespace_core::domain::server_config::ServerConfig;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./notespace.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output } => generate(&output),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = ServerConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. NOTESPACE_CONFIG_PATH: {}",
            std::env::var("NOTESPACE_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./notespace.yaml");
        println!("  4. ~/.notespace/config.yaml");
        println!("  5. /etc/notespace/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Server:".bold());
    println!("  Listen: {}:{}", config.bind_host, config.port);
    if config.url_prefix.is_empty() {
        println!("  URL prefix: {}", "(none)".dimmed());
    } else {
        println!("  URL prefix: {}", config.url_prefix);
    }
    println!("  HTTP logging: {}", config.http_logging);
    println!();

    println!("{}", "Space:".bold());
    println!("  Name: {}", config.space.name);
    println!("  Description: {}", config.space.description);
    println!("  Folder: {}", config.space.folder.display());
    println!("  Index page: {}", config.space.index_page);
    println!("  Read-only: {}", config.space.read_only);
    println!("  Walk threads: {}", config.space.walk_threads);
    let patterns: Vec<&str> = config
        .space
        .ignore
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if patterns.is_empty() {
        println!("  Ignore: {}", "(none)".dimmed());
    } else {
        println!("  Ignore:");
        for pattern in patterns {
            println!("    - {}", pattern);
        }
    }
    println!();

    println!("{}", "Bundle:".bold());
    match &config.bundle_dir {
        Some(dir) => println!("  Directory: {}", dir.display()),
        None => println!("  {}", "compiled-in".dimmed()),
    }
    println!();

    println!("{}", "Metrics:".bold());
    if config.metrics.enabled {
        println!("  Prometheus exporter on port {}", config.metrics.port);
    } else {
        println!("  {}", "disabled".dimmed());
    }
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config =
        ServerConfig::load_or_default(config_path).context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: &Path) -> Result<()> {
    std::fs::write(output, SAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
