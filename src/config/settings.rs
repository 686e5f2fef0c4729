use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dns::cloudflare::{CLOUDFLARE_API_ENDPOINT, DEFAULT_TTL};
use crate::ip::DEFAULT_IP_SERVICES;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub ip: IpConfig,
    pub zones: Vec<ZoneConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_interval() -> u64 {
    300 // 5 minutes
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

fn default_endpoint() -> String {
    CLOUDFLARE_API_ENDPOINT.to_string()
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpConfig {
    #[serde(default = "default_services")]
    pub services: Vec<String>,
    #[serde(default = "default_ip_timeout")]
    pub timeout_seconds: u64,
}

fn default_services() -> Vec<String> {
    DEFAULT_IP_SERVICES.iter().map(|s| s.to_string()).collect()
}

fn default_ip_timeout() -> u64 {
    10
}

/// A zone and the labels of the A records to keep pointed at us.
///
/// `"@"` or an empty label stands for the zone apex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    #[serde(default = "default_domains")]
    pub domains: Vec<String>,
}

fn default_domains() -> Vec<String> {
    vec!["@".to_string()]
}

impl ZoneConfig {
    pub fn new(name: &str, domains: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            domains: domains.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Labels with the apex markers mapped to `None`.
    pub fn labels(&self) -> impl Iterator<Item = Option<&str>> {
        self.domains.iter().map(|d| match d.trim() {
            "" | "@" => None,
            label => Some(label),
        })
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        Ok(settings)
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn config_dir() -> PathBuf {
        #[cfg(unix)]
        {
            PathBuf::from("/etc/zoneddns")
        }
        #[cfg(windows)]
        {
            PathBuf::from(r"C:\ProgramData\zoneddns")
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            ttl: default_ttl(),
        }
    }
}

impl Default for IpConfig {
    fn default() -> Self {
        Self {
            services: default_services(),
            timeout_seconds: default_ip_timeout(),
        }
    }
}
