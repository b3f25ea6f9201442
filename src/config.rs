//! Configuration Management
//!
//! Handles persistent configuration storage for hcctl. The password is never
//! written to disk.

use crate::hypercore::client::{ClientConfig, DEFAULT_POLL_INTERVAL};
use crate::report::perf::DEFAULT_SAMPLE_INTERVAL;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Cluster node address (host, IP, or base URL)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Default username
    #[serde(default)]
    pub username: Option<String>,
    /// Skip TLS certificate validation
    #[serde(default)]
    pub insecure: bool,
    /// Seconds between task status polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Seconds between performance samples
    #[serde(default = "default_sample_interval_secs")]
    pub sample_interval_secs: u64,
    /// Directory CSV reports are written to
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_sample_interval_secs() -> u64 {
    DEFAULT_SAMPLE_INTERVAL.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            username: None,
            insecure: false,
            poll_interval_secs: default_poll_interval_secs(),
            sample_interval_secs: default_sample_interval_secs(),
            output_dir: None,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("hcctl").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Build the client configuration (CLI > config file)
    pub fn client_config(&self, endpoint: Option<&str>, insecure: bool) -> Result<ClientConfig> {
        let endpoint = endpoint
            .map(str::to_string)
            .or_else(|| self.endpoint.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("No cluster endpoint configured. Use --endpoint or set it in the config file")
            })?;

        Ok(ClientConfig::new(&endpoint)
            .insecure(insecure || self.insecure)
            .poll_interval(Duration::from_secs(self.poll_interval_secs.max(1))))
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs.max(1))
    }

    /// Effective output directory (CLI > config > current directory)
    pub fn effective_output_dir(&self, cli: Option<&Path>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or_else(|| self.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Remember the endpoint and username for next time
    pub fn set_defaults(&mut self, endpoint: &str, username: &str) -> Result<()> {
        self.endpoint = Some(endpoint.to_string());
        self.username = Some(username.to_string());
        self.save()
    }
}
