//! Core functionality for the AuthChain identity ledger.
//!
//! This crate provides the fundamental types shared by every AuthChain
//! component: the hash-linked block ledger, the identity event schema,
//! node configuration and logging initialization.

pub mod config;
pub mod error;
pub mod event;
pub mod ledger;
pub mod logging;

pub use config::{
    Config, ConsensusConfig, LogFormat, LoggingConfig, NodeConfig, PeersConfig,
};
pub use error::{CoreError, Result};
pub use event::IdentityEvent;
pub use ledger::{
    compute_block_hash, current_timestamp_ms, validate_chain, Block, BlockObserver,
    ChainValidation, Ledger, LedgerError, LedgerMetrics, SharedLedger, GENESIS_PREVIOUS_HASH,
};
