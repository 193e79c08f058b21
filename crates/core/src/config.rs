//! Configuration management for AuthChain nodes.
//!
//! Configuration is read from a TOML file and may be overridden from the
//! environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `AUTHCHAIN_NODE_ID` | `node.node_id` |
//! | `AUTHCHAIN_LISTEN_ADDR` | `node.listen_addr` |
//! | `AUTHCHAIN_PEERS` | `peers.addresses` (comma separated) |
//! | `AUTHCHAIN_PEER_TIMEOUT_MS` | `peers.timeout_ms` |

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub node: NodeConfig,
    #[serde(default)]
    pub peers: PeersConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node_id: String,
    pub listen_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeersConfig {
    /// Base URLs of the peer nodes, e.g. `http://127.0.0.1:5002`
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Upper bound on every outbound peer call
    #[serde(default = "default_peer_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Reject peer chains that fail validation before comparing lengths
    #[serde(default)]
    pub validate_candidates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_peer_timeout_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PeersConfig {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            timeout_ms: default_peer_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

impl PeersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            node: NodeConfig {
                node_id: "node-5001".to_string(),
                listen_addr: "127.0.0.1:5001".to_string(),
            },
            peers: PeersConfig::default(),
            consensus: ConsensusConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with("AUTHCHAIN_"))
            .collect();
        self.apply_overrides(&vars)
    }

    /// Apply overrides from an explicit variable map.
    pub fn apply_overrides(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        if let Some(node_id) = vars.get("AUTHCHAIN_NODE_ID") {
            self.node.node_id = node_id.clone();
        }
        if let Some(addr) = vars.get("AUTHCHAIN_LISTEN_ADDR") {
            self.node.listen_addr = addr.clone();
        }
        if let Some(peers) = vars.get("AUTHCHAIN_PEERS") {
            self.peers.addresses = peers
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(timeout) = vars.get("AUTHCHAIN_PEER_TIMEOUT_MS") {
            self.peers.timeout_ms = timeout.parse().map_err(|_| {
                CoreError::Config(format!("AUTHCHAIN_PEER_TIMEOUT_MS is not a number: {}", timeout))
            })?;
        }
        Ok(())
    }

    /// Check the configuration for values the node cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.node.node_id.trim().is_empty() {
            return Err(CoreError::Config("node.node_id must not be empty".to_string()));
        }

        self.listen_addr()?;

        if self.peers.timeout_ms == 0 {
            return Err(CoreError::Config(
                "peers.timeout_ms must be greater than zero".to_string(),
            ));
        }

        for peer in &self.peers.addresses {
            if !(peer.starts_with("http://") || peer.starts_with("https://")) {
                return Err(CoreError::Config(format!(
                    "peer address must start with http:// or https://: {}",
                    peer
                )));
            }
        }

        Ok(())
    }

    /// Parsed listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.node.listen_addr.parse().map_err(|_| {
            CoreError::Config(format!(
                "node.listen_addr is not a socket address: {}",
                self.node.listen_addr
            ))
        })
    }
}
