// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Server Configuration Types
//
// Defines the configuration schema for a notespace server, including:
// - Listener address and optional host URL prefix
// - The space folder and its listing/ignore rules
// - Read-only mode
// - Observability settings (HTTP request logging, metrics exporter)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional prefix every route is mounted under (e.g. "/notes")
    #[serde(default)]
    pub url_prefix: String,

    /// Log every HTTP request
    #[serde(default)]
    pub http_logging: bool,

    /// Metrics exporter configuration
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// The space served by this process
    #[serde(default)]
    pub space: SpaceConfig,

    /// Serve client and base files from this folder instead of the
    /// compiled-in bundle (`client/` and `base_fs/` subfolders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceConfig {
    /// Root folder of the space
    #[serde(default = "default_space_folder")]
    pub folder: PathBuf,

    /// Page opened when no page is requested
    #[serde(default = "default_index_page")]
    pub index_page: String,

    /// Reject every write regardless of backend capability
    #[serde(default)]
    pub read_only: bool,

    /// Gitignore-style patterns excluded from listings, one per line
    #[serde(default)]
    pub ignore: String,

    /// Worker threads used for listing the space
    #[serde(default = "default_walk_threads")]
    pub walk_threads: usize,

    /// Human-readable space name
    #[serde(default = "default_space_name")]
    pub name: String,

    #[serde(default = "default_space_description")]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics exposition
    #[serde(default)]
    pub enabled: bool,

    /// Metrics endpoint port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_bind_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_space_folder() -> PathBuf {
    PathBuf::from("./space")
}

fn default_index_page() -> String {
    "index".to_string()
}

fn default_walk_threads() -> usize {
    8
}

fn default_space_name() -> String {
    "notespace".to_string()
}

fn default_space_description() -> String {
    "Note taking server".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            folder: default_space_folder(),
            index_page: default_index_page(),
            read_only: false,
            ignore: String::new(),
            walk_threads: default_walk_threads(),
            name: default_space_name(),
            description: default_space_description(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            port: default_port(),
            url_prefix: String::new(),
            http_logging: false,
            metrics: MetricsConfig::default(),
            space: SpaceConfig::default(),
            bundle_dir: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. NOTESPACE_CONFIG_PATH environment variable
    /// 2. ./notespace.yaml (working directory)
    /// 3. ~/.notespace/config.yaml (user home)
    /// 4. /etc/notespace/config.yaml (system, Unix) or C:\ProgramData\Notespace\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("NOTESPACE_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./notespace.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".notespace").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/notespace/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Notespace\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path must load
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    /// This allows container deployments to override config via env vars
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(folder) = lookup("NOTESPACE_FOLDER") {
            self.space.folder = PathBuf::from(folder);
        }

        if let Some(host) = lookup("NOTESPACE_HOSTNAME") {
            self.bind_host = host;
        }

        if let Some(port) = lookup("NOTESPACE_PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!(
                    "Invalid value for NOTESPACE_PORT: '{}'. Expected a port number. Ignoring.",
                    port
                ),
            }
        }

        if let Some(index_page) = lookup("NOTESPACE_INDEX_PAGE") {
            self.space.index_page = index_page;
        }

        if let Some(ignore) = lookup("NOTESPACE_SPACE_IGNORE") {
            tracing::info!("Ignoring files matching: {}", ignore);
            self.space.ignore = ignore;
        }

        if let Some(dir) = lookup("NOTESPACE_BUNDLE_DIR") {
            self.bundle_dir = Some(PathBuf::from(dir));
        }

        if let Some(prefix) = lookup("NOTESPACE_URL_PREFIX") {
            self.url_prefix = prefix;
        }

        if let Some(val) = lookup("NOTESPACE_READ_ONLY") {
            match parse_flag(&val) {
                Some(flag) => self.space.read_only = flag,
                None => tracing::warn!(
                    "Invalid value for NOTESPACE_READ_ONLY: '{}'. Expected true/false. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("NOTESPACE_HTTP_LOGGING") {
            match parse_flag(&val) {
                Some(flag) => self.http_logging = flag,
                None => tracing::warn!(
                    "Invalid value for NOTESPACE_HTTP_LOGGING: '{}'. Expected true/false. Ignoring.",
                    val
                ),
            }
        }

        self.url_prefix = normalize_url_prefix(&self.url_prefix);
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.space.folder.as_os_str().is_empty() {
            anyhow::bail!("No space folder configured. Pass a folder or set NOTESPACE_FOLDER.");
        }

        if self.port == 0 {
            anyhow::bail!("Invalid port: 0");
        }

        if self.space.walk_threads == 0 {
            anyhow::bail!("space.walk_threads must be at least 1");
        }

        if self.space.index_page.trim().is_empty() {
            anyhow::bail!("space.index_page must not be empty");
        }

        if let Some(dir) = &self.bundle_dir {
            if !dir.is_dir() {
                anyhow::bail!("bundle_dir {:?} is not a directory", dir);
            }
        }

        Ok(())
    }
}

/// Normalize a host URL prefix to "/segment" form, or empty
pub fn normalize_url_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
