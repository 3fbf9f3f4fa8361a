//! # Node Configuration
//!
//! Unified configuration for the grid engine, the TCP transport and the
//! runtime itself.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. TOML file: `EG_CONFIG`, or `node.toml` in the working directory if present
//! 3. Environment: `EG_HOST`, `EG_PORT`, `EG_FAN_OUT`, `EG_NODE_KEY`,
//!    `EG_PEERS` (comma-separated enodes), `EG_PING_INTERVAL_SECS`,
//!    `EG_CATALOG` (catalog `host:port`), `EG_MASTER_ADDRESS`
//!
//! ## Config File Format
//!
//! ```toml
//! node_key = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
//! peers = ["enode://0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf@127.0.0.1:30304"]
//! ping_interval_secs = 10
//!
//! [network]
//! host = "127.0.0.1"
//! port = 30303
//!
//! [elastic]
//! fan_out = 16
//! verify_router = true
//!
//! [transport]
//! max_frame_size = 16777216
//! connect_timeout_ms = 5000
//! read_timeout_ms = 30000
//!
//! [catalog]
//! endpoint = "127.0.0.1:9000"
//! master_address = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
//! reconnect_secs = 5
//! ```

use eg_04_dissemination::ElasticConfig;
use eg_05_tcp_transport::TransportConfig;
use serde::Deserialize;
use shared_types::Address;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File read when `EG_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "node.toml";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 30303;

/// Default delay between catalog reconnect attempts.
pub const DEFAULT_RECONNECT_SECS: u64 = 5;

/// Complete node configuration.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Listen endpoint, also advertised as this node's own peer entry.
    pub network: NetworkConfig,
    /// Dissemination engine settings.
    pub elastic: ElasticConfig,
    /// TCP transport settings.
    pub transport: TransportConfig,
    /// Hex node secret. A fresh key is generated when absent.
    pub node_key: Option<String>,
    /// Initial peer catalog in enode form.
    pub peers: Vec<String>,
    /// Broadcast a ping this often when set.
    pub ping_interval_secs: Option<u64>,
    /// Catalog service feeding the peer directory, if any.
    pub catalog: Option<CatalogConfig>,
}

// The node secret never reaches logs.
impl fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeConfig")
            .field("network", &self.network)
            .field("elastic", &self.elastic)
            .field("transport", &self.transport)
            .field("node_key", &self.node_key.as_ref().map(|_| "<redacted>"))
            .field("peers", &self.peers)
            .field("ping_interval_secs", &self.ping_interval_secs)
            .field("catalog", &self.catalog)
            .finish()
    }
}

/// Network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl NetworkConfig {
    /// `host:port` for binding the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Catalog service connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// `host:port` of the catalog service.
    pub endpoint: String,
    /// Signer every `update` snapshot must carry.
    pub master_address: String,
    pub reconnect_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            master_address: String::new(),
            reconnect_secs: DEFAULT_RECONNECT_SECS,
        }
    }
}

impl CatalogConfig {
    pub fn master(&self) -> Result<Address, ConfigError> {
        Address::from_hex(&self.master_address).map_err(|e| {
            ConfigError::Invalid(format!("catalog.master_address: {e}"))
        })
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::Invalid("catalog.endpoint is empty".to_string()));
        }
        if self.reconnect_secs == 0 {
            return Err(ConfigError::Invalid(
                "catalog.reconnect_secs must be positive".to_string(),
            ));
        }
        self.master().map(|_| ())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl NodeConfig {
    /// Load configuration from file and process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `EG_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("EG_HOST") {
            self.network.host = host;
        }
        if let Some(port) = lookup("EG_PORT") {
            self.network.port = parse_env("EG_PORT", port)?;
        }
        if let Some(fan_out) = lookup("EG_FAN_OUT") {
            self.elastic.fan_out = parse_env("EG_FAN_OUT", fan_out)?;
        }
        if let Some(key) = lookup("EG_NODE_KEY") {
            self.node_key = Some(key);
        }
        if let Some(peers) = lookup("EG_PEERS") {
            self.peers = peers
                .split(',')
                .map(str::trim)
                .filter(|peer| !peer.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(secs) = lookup("EG_PING_INTERVAL_SECS") {
            self.ping_interval_secs = Some(parse_env("EG_PING_INTERVAL_SECS", secs)?);
        }
        if let Some(endpoint) = lookup("EG_CATALOG") {
            self.catalog.get_or_insert_with(Default::default).endpoint = endpoint;
        }
        if let Some(master) = lookup("EG_MASTER_ADDRESS") {
            self.catalog.get_or_insert_with(Default::default).master_address = master;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.elastic.validate().map_err(ConfigError::Invalid)?;
        if self.network.host.is_empty() {
            return Err(ConfigError::Invalid("network.host is empty".to_string()));
        }
        if self.transport.max_frame_size == 0 {
            return Err(ConfigError::Invalid(
                "transport.max_frame_size must be positive".to_string(),
            ));
        }
        if self.ping_interval_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "ping_interval_secs must be positive".to_string(),
            ));
        }
        if let Some(catalog) = &self.catalog {
            catalog.validate()?;
        }
        Ok(())
    }

    pub fn ping_interval(&self) -> Option<Duration> {
        self.ping_interval_secs.map(Duration::from_secs)
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("EG_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.exists().then_some(default)
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}
