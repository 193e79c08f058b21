//! Identity Ledger - Append-Only Hash-Linked Block Chain
//!
//! This module provides the in-memory ledger that records every identity
//! event of a node:
//! - Fixed genesis block seeded at construction
//! - Strict append-only semantics through `add_block`
//! - Continuity check for blocks proposed by peers
//! - Whole-chain validation for externally supplied chains
//!
//! # Block Structure
//!
//! Each block carries:
//! - index: Position in the chain, 0 for genesis
//! - timestamp: Creation time (Unix milliseconds)
//! - data: The identity event
//! - previous_hash: Hash of the previous block (`"0"` for genesis)
//! - hash: BLAKE3 digest over (index, timestamp, data, previous_hash)
//!
//! # Guarantees
//!
//! - Strict ordering: index increases by 1 for each block
//! - Chain continuity: previous_hash matches the previous block's hash
//! - Self-consistency: every hash is the digest of its own block fields

use crate::event::IdentityEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Sentinel stored as `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Ledger shared between the request handlers, peer sync and consensus.
pub type SharedLedger = Arc<RwLock<Ledger>>;

/// One hash-linked ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain
    pub index: u64,
    /// Creation timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Identity event recorded by this block
    pub data: IdentityEvent,
    /// Hash of the preceding block
    pub previous_hash: String,
    /// Digest of this block's other fields
    pub hash: String,
}

impl Block {
    /// Builds a block and computes its hash.
    pub fn new(
        index: u64,
        timestamp: u64,
        data: IdentityEvent,
        previous_hash: impl Into<String>,
    ) -> Self {
        let previous_hash = previous_hash.into();
        let hash = compute_block_hash(index, timestamp, &data, &previous_hash);
        Self {
            index,
            timestamp,
            data,
            previous_hash,
            hash,
        }
    }

    /// The fixed index-0 block shared by every node.
    pub fn genesis() -> Self {
        Self::new(0, 0, IdentityEvent::Genesis, GENESIS_PREVIOUS_HASH)
    }

    /// Recomputes the digest of this block's fields.
    pub fn compute_hash(&self) -> String {
        compute_block_hash(self.index, self.timestamp, &self.data, &self.previous_hash)
    }

    /// Whether the stored hash matches the block's fields.
    pub fn verify_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }
}

/// Computes the lowercase hex BLAKE3 digest of a block's fields.
pub fn compute_block_hash(
    index: u64,
    timestamp: u64,
    data: &IdentityEvent,
    previous_hash: &str,
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&index.to_le_bytes());
    hasher.update(&timestamp.to_le_bytes());
    data.hash_into(&mut hasher);
    hasher.update(previous_hash.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Errors that can occur in ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Hash mismatch: expected previous_hash {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("Chain is empty")]
    EmptyChain,

    #[error("Ledger lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result of validating a whole chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainValidation {
    /// Chain is valid
    Valid,
    /// First violation found while walking the chain
    Invalid { index: usize, reason: String },
}

impl ChainValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, ChainValidation::Valid)
    }
}

impl fmt::Display for ChainValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainValidation::Valid => write!(f, "valid"),
            ChainValidation::Invalid { index, reason } => {
                write!(f, "invalid at index {}: {}", index, reason)
            }
        }
    }
}

/// Walks `chain` and reports the first block breaking the ledger invariant.
///
/// Checks:
/// 1. The chain is non-empty and starts with an index-0 block carrying the
///    genesis sentinel
/// 2. Every block's index equals its position
/// 3. Every block's hash is the digest of its own fields
/// 4. Every block's previous_hash equals the hash of the block before it
pub fn validate_chain(chain: &[Block]) -> ChainValidation {
    let Some(first) = chain.first() else {
        return ChainValidation::Invalid {
            index: 0,
            reason: "empty_chain".to_string(),
        };
    };

    if first.previous_hash != GENESIS_PREVIOUS_HASH {
        return ChainValidation::Invalid {
            index: 0,
            reason: "invalid_genesis: previous_hash is not the sentinel".to_string(),
        };
    }

    for (i, block) in chain.iter().enumerate() {
        if block.index != i as u64 {
            return ChainValidation::Invalid {
                index: i,
                reason: format!("index_mismatch: block claims index {}", block.index),
            };
        }

        if !block.verify_hash() {
            return ChainValidation::Invalid {
                index: i,
                reason: "hash_mismatch: stored hash does not match block fields".to_string(),
            };
        }

        if i > 0 && block.previous_hash != chain[i - 1].hash {
            return ChainValidation::Invalid {
                index: i,
                reason: "broken_link: previous_hash does not match preceding block".to_string(),
            };
        }
    }

    ChainValidation::Valid
}

/// Receives every block created locally.
pub trait BlockObserver: Send + Sync {
    fn on_block_appended(&self, block: &Block);
}

/// Observability metrics for the ledger
#[derive(Debug, Default, Clone)]
pub struct LedgerMetrics {
    /// Blocks created locally through `add_block`
    pub blocks_appended_total: u64,
    /// Peer blocks accepted through `accept_incoming`
    pub incoming_accepted_total: u64,
    /// Peer blocks rejected through `accept_incoming`
    pub incoming_rejected_total: u64,
    /// Whole-chain replacements performed by consensus
    pub chain_replacements_total: u64,
}

/// In-memory hash-linked ledger of one node.
#[derive(Debug)]
pub struct Ledger {
    blocks: Vec<Block>,
    metrics: LedgerMetrics,
}

impl Ledger {
    /// Create a ledger seeded with the genesis block.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::genesis()],
            metrics: LedgerMetrics::default(),
        }
    }

    /// Create a ledger over an existing block list without validating it.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            metrics: LedgerMetrics::default(),
        }
    }

    /// Wrap a fresh ledger for sharing across components.
    pub fn shared() -> SharedLedger {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Append a new block recording `event` and return it.
    ///
    /// The timestamp never goes backwards relative to the latest block, so
    /// block order and timestamp order always agree.
    pub fn add_block(&mut self, event: IdentityEvent) -> Block {
        let (index, previous_hash, floor) = match self.blocks.last() {
            Some(last) => (self.blocks.len() as u64, last.hash.clone(), last.timestamp),
            None => (0, GENESIS_PREVIOUS_HASH.to_string(), 0),
        };
        let timestamp = current_timestamp_ms().max(floor);

        let block = Block::new(index, timestamp, event, previous_hash);
        self.blocks.push(block.clone());
        self.metrics.blocks_appended_total += 1;

        debug!(
            index = block.index,
            action = block.data.action(),
            hash = %block.hash,
            "Block appended to ledger"
        );

        block
    }

    /// The most recent block.
    pub fn latest(&self) -> Result<&Block, LedgerError> {
        self.blocks.last().ok_or(LedgerError::EmptyChain)
    }

    /// Whether `chain` satisfies the ledger invariant.
    pub fn validate(chain: &[Block]) -> bool {
        validate_chain(chain).is_valid()
    }

    /// Accept a block proposed by a peer if it extends the local chain.
    ///
    /// The block must link to the latest local block, carry the next index
    /// and hash correctly. On rejection the chain is left unchanged.
    pub fn accept_incoming(&mut self, block: Block) -> Result<(), LedgerError> {
        let latest_hash = self.latest()?.hash.clone();

        if block.previous_hash != latest_hash {
            self.metrics.incoming_rejected_total += 1;
            warn!(
                index = block.index,
                expected = %latest_hash,
                actual = %block.previous_hash,
                "Rejected incoming block: previous hash mismatch"
            );
            return Err(LedgerError::HashMismatch {
                expected: latest_hash,
                actual: block.previous_hash,
            });
        }

        let expected_index = self.blocks.len() as u64;
        if block.index != expected_index || !block.verify_hash() {
            self.metrics.incoming_rejected_total += 1;
            let computed = block.compute_hash();
            warn!(
                index = block.index,
                expected_index,
                "Rejected incoming block: block does not hash to its claimed position"
            );
            return Err(LedgerError::HashMismatch {
                expected: computed,
                actual: block.hash,
            });
        }

        debug!(index = block.index, hash = %block.hash, "Accepted incoming block");
        self.blocks.push(block);
        self.metrics.incoming_accepted_total += 1;
        Ok(())
    }

    /// Replace the whole chain, as decided by consensus.
    pub fn replace_chain(&mut self, blocks: Vec<Block>) {
        info!(
            old_length = self.blocks.len(),
            new_length = blocks.len(),
            "Replacing local chain"
        );
        self.blocks = blocks;
        self.metrics.chain_replacements_total += 1;
    }

    /// All blocks in order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Owned copy of the chain.
    pub fn snapshot(&self) -> Vec<Block> {
        self.blocks.clone()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get ledger metrics
    pub fn metrics(&self) -> &LedgerMetrics {
        &self.metrics
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

/// Get current timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
