//! Configuration for stall-cashier.
//!
//! Supports loading from TOML file with CLI argument overrides.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use stall_link::{LinkConfig, DEFAULT_PORT};

/// Top-level configuration for stall-cashier.
#[derive(Debug, Clone)]
pub struct CashierConfig {
    pub log_level: String,
    /// Broker host to connect to on startup. When unset the operator is
    /// asked for one.
    pub host: Option<String>,
    pub link: LinkConfig,
}

impl Default for CashierConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            host: None,
            link: LinkConfig::default(),
        }
    }
}

impl CashierConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlConfig = toml::from_str(content).context("Failed to parse TOML config")?;

        Ok(Self {
            log_level: file.general.log_level,
            host: file.link.host.filter(|h| !h.trim().is_empty()),
            link: LinkConfig {
                port: file.link.port,
                connect_timeout: Duration::from_secs(file.link.connect_timeout_secs),
                ..LinkConfig::default()
            },
        })
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(
        &mut self,
        host: Option<String>,
        port: Option<u16>,
        log_level: Option<String>,
    ) {
        if host.is_some() {
            self.host = host;
        }
        if let Some(port) = port {
            self.link.port = port;
        }
        if let Some(level) = log_level {
            self.log_level = level;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    #[serde(default)]
    general: GeneralToml,
    #[serde(default)]
    link: LinkToml,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GeneralToml {
    log_level: String,
}

impl Default for GeneralToml {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LinkToml {
    host: Option<String>,
    port: u16,
    connect_timeout_secs: u64,
}

impl Default for LinkToml {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            connect_timeout_secs: 10,
        }
    }
}
