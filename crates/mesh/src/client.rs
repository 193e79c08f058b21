//! HTTP client for peer calls.

use crate::error::{MeshError, MeshResult};
use crate::messages::{ChainResponse, SyncBlockRequest, CHAIN_PATH, SYNC_BLOCK_PATH};
use crate::peer::PeerInfo;
use authchain_core::Block;
use std::time::Duration;

/// Shared outbound client; every call is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct PeerClient {
    http: reqwest::Client,
}

impl PeerClient {
    pub fn new(timeout: Duration) -> MeshResult<Self> {
        if timeout.is_zero() {
            return Err(MeshError::Config(
                "peer timeout must be greater than zero".to_string(),
            ));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// POST `block` to the peer's sync endpoint.
    pub async fn push_block(&self, peer: &PeerInfo, block: &Block) -> MeshResult<()> {
        let request = SyncBlockRequest {
            block: block.clone(),
        };
        let response = self
            .http
            .post(peer.endpoint(SYNC_BLOCK_PATH))
            .json(&request)
            .send()
            .await?;

        check_status(peer, response.status())
    }

    /// GET the peer's full chain.
    pub async fn fetch_chain(&self, peer: &PeerInfo) -> MeshResult<Vec<Block>> {
        let response = self.http.get(peer.endpoint(CHAIN_PATH)).send().await?;
        check_status(peer, response.status())?;

        let body: ChainResponse = response.json().await?;
        Ok(body.chain)
    }
}

fn check_status(peer: &PeerInfo, status: reqwest::StatusCode) -> MeshResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(MeshError::PeerStatus {
            peer: peer.address.clone(),
            status: status.as_u16(),
        })
    }
}
