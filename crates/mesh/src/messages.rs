//! Peer wire messages.

use authchain_core::Block;
use serde::{Deserialize, Serialize};

/// Path peers accept pushed blocks on.
pub const SYNC_BLOCK_PATH: &str = "/sync_block";

/// Path peers serve their chain on.
pub const CHAIN_PATH: &str = "/chain";

/// Body of `POST /sync_block`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncBlockRequest {
    pub block: Block,
}

/// Body of `GET /chain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainResponse {
    pub length: usize,
    pub chain: Vec<Block>,
}

impl ChainResponse {
    pub fn from_chain(chain: Vec<Block>) -> Self {
        Self {
            length: chain.len(),
            chain,
        }
    }
}
