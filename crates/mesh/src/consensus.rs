//! Consensus Engine - Longest Chain Adoption
//!
//! Reconciliation is on demand. The engine fetches every peer's chain
//! concurrently, picks the longest one that is strictly longer than the local
//! chain and swaps it in.
//!
//! # Rules
//!
//! 1. Unreachable peers and malformed responses are skipped
//! 2. Candidates are considered in peer configuration order; a candidate
//!    replaces the running best only when strictly longer
//! 3. Ties with the local chain keep the local chain
//! 4. Candidate validation is opt-in (`consensus.validate_candidates`)
//!
//! No ledger lock is held while waiting on peers. The length comparison is
//! repeated under the write lock, so blocks appended meanwhile are never
//! discarded by a chain that is no longer longer.

use crate::client::PeerClient;
use crate::error::{MeshError, MeshResult};
use crate::peer::PeerTable;
use authchain_core::{validate_chain, Block, ConsensusConfig, PeersConfig, SharedLedger};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Outcome of one reconciliation round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Local chain length after the round
    pub length: usize,
    /// Whether the local chain was replaced
    pub replaced: bool,
    /// Peer the adopted chain came from
    pub source: Option<String>,
    pub peers_polled: usize,
    pub peers_unreachable: usize,
}

/// Polls peers and adopts the longest chain.
pub struct ConsensusEngine {
    node_id: String,
    ledger: SharedLedger,
    peers: PeerTable,
    client: PeerClient,
    validate_candidates: bool,
}

impl ConsensusEngine {
    pub fn new(
        node_id: impl Into<String>,
        ledger: SharedLedger,
        peers: PeerTable,
        client: PeerClient,
        validate_candidates: bool,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            ledger,
            peers,
            client,
            validate_candidates,
        }
    }

    pub fn from_config(
        node_id: impl Into<String>,
        ledger: SharedLedger,
        peers: &PeersConfig,
        consensus: &ConsensusConfig,
    ) -> MeshResult<Self> {
        let client = PeerClient::new(peers.timeout())?;
        Ok(Self::new(
            node_id,
            ledger,
            PeerTable::new(&peers.addresses),
            client,
            consensus.validate_candidates,
        ))
    }

    /// Run one reconciliation round.
    pub async fn reconcile(&self) -> MeshResult<ReconcileReport> {
        let mut tasks = JoinSet::new();
        for (position, peer) in self.peers.iter().enumerate() {
            let client = self.client.clone();
            let peer = peer.clone();
            tasks.spawn(async move {
                let result = client.fetch_chain(&peer).await;
                (position, peer, result)
            });
        }

        let mut fetched = Vec::with_capacity(self.peers.len());
        let mut peers_unreachable = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, peer, Ok(chain))) => {
                    debug!(
                        node_id = %self.node_id,
                        peer = %peer.address,
                        length = chain.len(),
                        "Fetched peer chain"
                    );
                    fetched.push((position, peer.address, chain));
                }
                Ok((_, peer, Err(e))) => {
                    peers_unreachable += 1;
                    warn!(
                        node_id = %self.node_id,
                        peer = %peer.address,
                        error = %e,
                        "Peer chain unavailable"
                    );
                }
                Err(e) => {
                    peers_unreachable += 1;
                    warn!(node_id = %self.node_id, error = %e, "Chain fetch task failed");
                }
            }
        }
        fetched.sort_by_key(|(position, _, _)| *position);
        let candidates = fetched
            .into_iter()
            .map(|(_, address, chain)| (address, chain))
            .collect();

        let local_len = self
            .ledger
            .read()
            .map_err(|e| MeshError::LockPoisoned(format!("ledger: {}", e)))?
            .len();
        let choice = choose_chain(local_len, candidates, self.validate_candidates);

        let mut ledger = self
            .ledger
            .write()
            .map_err(|e| MeshError::LockPoisoned(format!("ledger: {}", e)))?;

        let mut source = None;
        if let Some((address, chain)) = choice {
            if chain.len() > ledger.len() {
                info!(
                    node_id = %self.node_id,
                    peer = %address,
                    old_length = ledger.len(),
                    new_length = chain.len(),
                    "Adopting longer peer chain"
                );
                ledger.replace_chain(chain);
                source = Some(address);
            } else {
                debug!(
                    node_id = %self.node_id,
                    peer = %address,
                    "Local chain grew during reconciliation, keeping it"
                );
            }
        }

        Ok(ReconcileReport {
            length: ledger.len(),
            replaced: source.is_some(),
            source,
            peers_polled: self.peers.len(),
            peers_unreachable,
        })
    }

    pub fn peers(&self) -> &PeerTable {
        &self.peers
    }
}

/// Pick the chain to adopt, if any.
///
/// Walks `candidates` in order keeping a running best that starts at
/// `local_len` and is replaced only by a strictly longer chain. With
/// `validate` set, candidates failing chain validation are skipped.
pub fn choose_chain(
    local_len: usize,
    candidates: Vec<(String, Vec<Block>)>,
    validate: bool,
) -> Option<(String, Vec<Block>)> {
    let mut best_len = local_len;
    let mut best = None;

    for (address, chain) in candidates {
        if chain.len() <= best_len {
            continue;
        }
        if validate {
            let validation = validate_chain(&chain);
            if !validation.is_valid() {
                warn!(peer = %address, %validation, "Rejected invalid peer chain");
                continue;
            }
        }
        best_len = chain.len();
        best = Some((address, chain));
    }

    best
}
