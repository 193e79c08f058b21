//! Static peer table.
//!
//! Peers are configured as HTTP base URLs. Addresses are normalized by
//! trimming whitespace and trailing slashes; duplicates are dropped while
//! keeping configuration order, which consensus relies on for tie-breaks.

use serde::{Deserialize, Serialize};

/// One configured peer node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerInfo {
    /// Base URL, e.g. `http://127.0.0.1:5002`
    pub address: String,
}

impl PeerInfo {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.trim().trim_end_matches('/').to_string(),
        }
    }

    /// Full URL of `path` on this peer.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.address, path.trim_start_matches('/'))
    }
}

/// Peers of one node in configuration order.
#[derive(Debug, Clone, Default)]
pub struct PeerTable {
    peers: Vec<PeerInfo>,
}

impl PeerTable {
    pub fn new<S: AsRef<str>>(addresses: &[S]) -> Self {
        let mut peers: Vec<PeerInfo> = Vec::with_capacity(addresses.len());
        for address in addresses {
            let peer = PeerInfo::new(address.as_ref());
            if peer.address.is_empty() || peers.contains(&peer) {
                continue;
            }
            peers.push(peer);
        }
        Self { peers }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerInfo> {
        self.peers.iter()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.peers.iter().map(|p| p.address.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
