//! Configuration file handling

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Provider selection
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Default values for provision requests
    #[serde(default)]
    pub defaults: RequestDefaults,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Simulated provider catalog
    #[serde(default)]
    pub sim: SimConfig,
}

/// Provider selection
#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    /// Which provider backend to use ("sim" is the only built-in)
    #[serde(default = "default_provider_kind")]
    pub kind: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
        }
    }
}

fn default_provider_kind() -> String {
    "sim".to_string()
}

/// Default values applied to scenario requests that omit them
#[derive(Debug, Deserialize)]
pub struct RequestDefaults {
    #[serde(default = "default_image")]
    pub image: String,

    #[serde(default = "default_hardware")]
    pub hardware: String,

    #[serde(default = "default_location")]
    pub location: String,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            image: default_image(),
            hardware: default_hardware(),
            location: default_location(),
        }
    }
}

fn default_image() -> String {
    "ubuntu-14_04-lts".to_string()
}
fn default_hardware() -> String {
    "BASIC_A0".to_string()
}
fn default_location() -> String {
    "West Europe".to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Clone, Deserialize)]
pub struct Timeouts {
    /// Timeout for the create-nodes call
    #[serde(default = "default_provision")]
    pub provision_secs: u64,

    /// Bounded retry window for connecting to a node
    #[serde(default = "default_connect")]
    pub connect_secs: u64,

    /// Delay between connect attempts inside the retry window
    #[serde(default = "default_connect_retry")]
    pub connect_retry_millis: u64,

    /// Timeout for a single remote command
    #[serde(default = "default_exec")]
    pub exec_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            provision_secs: default_provision(),
            connect_secs: default_connect(),
            connect_retry_millis: default_connect_retry(),
            exec_secs: default_exec(),
        }
    }
}

fn default_provision() -> u64 {
    300
}
fn default_connect() -> u64 {
    60
}
fn default_connect_retry() -> u64 {
    500
}
fn default_exec() -> u64 {
    30
}

/// Catalog of upstream resources known to the simulated provider
///
/// Requests that reference a storage account, network, or subnet outside
/// this catalog are rejected with an invalid-configuration error.
#[derive(Debug, Deserialize)]
pub struct SimConfig {
    #[serde(default = "default_storage_accounts")]
    pub storage_accounts: Vec<String>,

    /// Virtual networks mapped to their subnets
    #[serde(default = "default_networks")]
    pub networks: HashMap<String, Vec<String>>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            storage_accounts: default_storage_accounts(),
            networks: default_networks(),
        }
    }
}

fn default_storage_accounts() -> Vec<String> {
    vec!["provcheckstore".to_string()]
}

fn default_networks() -> HashMap<String, Vec<String>> {
    let mut networks = HashMap::new();
    networks.insert(
        "jclouds-vnet".to_string(),
        vec!["jclouds-1".to_string()],
    );
    networks
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_sections() {
        let config = Config::default();
        assert_eq!(config.provider.kind, "sim");
        assert_eq!(config.defaults.hardware, "BASIC_A0");
        assert_eq!(config.timeouts.exec_secs, 30);
        assert!(config.sim.networks.contains_key("jclouds-vnet"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
[timeouts]
exec_secs = 5

[sim]
storage_accounts = ["mystore"]
"#,
        )
        .unwrap();
        assert_eq!(config.timeouts.exec_secs, 5);
        assert_eq!(config.timeouts.connect_secs, 60);
        assert_eq!(config.sim.storage_accounts, vec!["mystore"]);
        assert_eq!(config.defaults.image, "ubuntu-14_04-lts");
    }
}
