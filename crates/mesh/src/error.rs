//! Error types for AuthChain mesh operations.
//!
//! This module covers outbound peer calls and the ledger operations peers
//! trigger on this node.

use thiserror::Error;

/// Errors that can occur in mesh operations.
#[derive(Debug, Error)]
pub enum MeshError {
    /// Transport, timeout or body decoding failure talking to a peer
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Peer answered with a non-success status
    #[error("Peer {peer} answered with status {status}")]
    PeerStatus { peer: String, status: u16 },

    /// Ledger rejected a block or chain
    #[error("Ledger error: {0}")]
    Ledger(#[from] authchain_core::LedgerError),

    /// Shared ledger lock poisoned by a panicking writer
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;
