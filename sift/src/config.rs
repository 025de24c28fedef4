//! Configuration for ksearch.
//!
//! KSEARCH_ROOT resolution order:
//! 1. Explicit path passed to Config::load_from()
//! 2. KSEARCH_ROOT environment variable
//! 3. Default: platform config directory (e.g. ~/.config/ksearch)

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable overriding the configured server URL.
pub const SERVER_URL_VAR: &str = "KSEARCH_SERVER_URL";

/// ksearch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml.
    #[serde(skip)]
    pub root: PathBuf,

    /// Base URL of the search server (e.g. https://chef.example.com/organizations/acme).
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Identity sent with each request.
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Rows requested per page when --rows is not given.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Default output format: summary, text, json, yaml.
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_server_url() -> String {
    "https://localhost".to_string()
}

fn default_client_name() -> String {
    // Chef defaults node_name to the machine's hostname
    gethostname::gethostname().to_string_lossy().to_string()
}

fn default_page_size() -> usize {
    1_000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_format() -> String {
    "summary".to_string()
}

impl Config {
    /// Create a new config rooted at the given directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            server_url: default_server_url(),
            client_name: default_client_name(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            format: default_format(),
        }
    }

    /// Load config using default root resolution.
    pub fn load() -> Result<Self> {
        let root = resolve_root()?;
        Self::load_from(&root)
    }

    /// Load config from a specific root, or fall back to defaults.
    pub fn load_from(root: &Path) -> Result<Self> {
        let config_path = root.join("config.toml");

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let mut config: Config = toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
            config.root = root.to_path_buf();
            config
        } else {
            Self::with_root(root)
        };

        if let Ok(url) = std::env::var(SERVER_URL_VAR) {
            if !url.trim().is_empty() {
                config.server_url = url;
            }
        }

        if config.page_size == 0 {
            return Err(Error::Config("page_size must be greater than zero".to_string()));
        }

        Ok(config)
    }

    /// Save config to ROOT/config.toml.
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(self.config_path(), contents)?;
        Ok(())
    }

    /// Path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }
}

/// Resolve the config root using the standard resolution order.
fn resolve_root() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("KSEARCH_ROOT") {
        return Ok(PathBuf::from(path));
    }

    if let Some(proj_dirs) = ProjectDirs::from("", "", "ksearch") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = std::env::var("HOME")
        .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;
    Ok(PathBuf::from(home).join(".config/ksearch"))
}
