//! Configuration for stall-kiosk.
//!
//! Supports loading from TOML file with CLI argument overrides.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use stall_common::{Menu, MenuSpec};
use stall_link::{LinkConfig, DEFAULT_PORT};

/// Top-level configuration for stall-kiosk.
#[derive(Debug, Clone)]
pub struct KioskConfig {
    pub log_level: String,
    /// Broker host the kiosk always connects to.
    pub host: String,
    pub link: LinkConfig,
    pub initial_reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
    pub menu: Menu,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            host: "localhost".to_string(),
            link: LinkConfig::default(),
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(60),
            menu: Menu::default(),
        }
    }
}

impl KioskConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlConfig = toml::from_str(content).context("Failed to parse TOML config")?;

        let menu = match file.menu {
            Some(spec) => Menu::try_from(spec).context("Invalid [menu] section")?,
            None => Menu::default(),
        };

        Ok(Self {
            log_level: file.general.log_level,
            host: file.link.host,
            link: LinkConfig {
                port: file.link.port,
                connect_timeout: Duration::from_secs(file.link.connect_timeout_secs),
                ..LinkConfig::default()
            },
            initial_reconnect_delay: Duration::from_secs(file.link.initial_reconnect_delay_secs),
            max_reconnect_delay: Duration::from_secs(file.link.max_reconnect_delay_secs),
            menu,
        })
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(
        &mut self,
        host: Option<String>,
        port: Option<u16>,
        log_level: Option<String>,
    ) {
        if let Some(host) = host {
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

/// TOML file structure for deserialization.
#[derive(Debug, Deserialize)]
struct TomlConfig {
    #[serde(default)]
    general: GeneralToml,
    #[serde(default)]
    link: LinkToml,
    #[serde(default)]
    menu: Option<MenuSpec>,
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
    host: String,
    port: u16,
    connect_timeout_secs: u64,
    initial_reconnect_delay_secs: u64,
    max_reconnect_delay_secs: u64,
}

impl Default for LinkToml {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            connect_timeout_secs: 10,
            initial_reconnect_delay_secs: 1,
            max_reconnect_delay_secs: 60,
        }
    }
}
