//! Peer Sync - Block Propagation
//!
//! Every block created on this node is queued for every configured peer.
//! Blocks pushed by peers are accepted only when they extend the local chain.
//!
//! # Delivery
//!
//! - One long-lived worker per peer drains that peer's queue in FIFO order
//! - Workers start on the first broadcast made inside a Tokio runtime
//! - Failures are logged and counted, never retried
//! - Received blocks are not relayed further

use crate::client::PeerClient;
use crate::error::{MeshError, MeshResult};
use crate::peer::{PeerInfo, PeerTable};
use authchain_core::{Block, BlockObserver, PeersConfig, SharedLedger};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Sync counters, shared with the peer workers.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    blocks_pushed_total: AtomicU64,
    push_failures_total: AtomicU64,
    blocks_received_total: AtomicU64,
    blocks_rejected_total: AtomicU64,
}

/// Point-in-time copy of [`SyncMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub blocks_pushed_total: u64,
    pub push_failures_total: u64,
    pub blocks_received_total: u64,
    pub blocks_rejected_total: u64,
}

impl SyncMetrics {
    pub fn snapshot(&self) -> SyncStats {
        SyncStats {
            blocks_pushed_total: self.blocks_pushed_total.load(Ordering::Relaxed),
            push_failures_total: self.push_failures_total.load(Ordering::Relaxed),
            blocks_received_total: self.blocks_received_total.load(Ordering::Relaxed),
            blocks_rejected_total: self.blocks_rejected_total.load(Ordering::Relaxed),
        }
    }
}

/// Outbound queue of one peer, drained by that peer's worker.
struct PeerQueue {
    peer: PeerInfo,
    sender: mpsc::UnboundedSender<Block>,
}

/// Pushes local blocks to peers and accepts blocks from them.
pub struct PeerSync {
    node_id: String,
    ledger: SharedLedger,
    peers: PeerTable,
    client: PeerClient,
    metrics: Arc<SyncMetrics>,
    queues: OnceLock<Vec<PeerQueue>>,
}

impl PeerSync {
    pub fn new(
        node_id: impl Into<String>,
        ledger: SharedLedger,
        peers: PeerTable,
        client: PeerClient,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            ledger,
            peers,
            client,
            metrics: Arc::new(SyncMetrics::default()),
            queues: OnceLock::new(),
        }
    }

    pub fn from_config(
        node_id: impl Into<String>,
        ledger: SharedLedger,
        config: &PeersConfig,
    ) -> MeshResult<Self> {
        let client = PeerClient::new(config.timeout())?;
        Ok(Self::new(
            node_id,
            ledger,
            PeerTable::new(&config.addresses),
            client,
        ))
    }

    /// Queue `block` for every peer. Returns the number of pushes queued.
    ///
    /// Blocks reach each peer in the order they were queued. Must be called
    /// from within a Tokio runtime; otherwise nothing is sent.
    pub fn broadcast(&self, block: &Block) -> usize {
        if self.peers.is_empty() {
            return 0;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(
                    node_id = %self.node_id,
                    index = block.index,
                    "No async runtime available, block not broadcast"
                );
                return 0;
            }
        };

        let mut queued = 0;
        for queue in self.queues(&handle) {
            if queue.sender.send(block.clone()).is_ok() {
                queued += 1;
            } else {
                self.metrics
                    .push_failures_total
                    .fetch_add(1, Ordering::Relaxed);
                warn!(
                    node_id = %self.node_id,
                    peer = %queue.peer.address,
                    index = block.index,
                    "Peer worker stopped, block dropped"
                );
            }
        }

        debug!(
            node_id = %self.node_id,
            index = block.index,
            peers = queued,
            "Block queued for peers"
        );
        queued
    }

    /// Append a block pushed by a peer if it extends the local chain.
    pub fn receive(&self, block: Block) -> MeshResult<()> {
        let index = block.index;
        let mut ledger = self
            .ledger
            .write()
            .map_err(|e| MeshError::LockPoisoned(format!("ledger: {}", e)))?;

        match ledger.accept_incoming(block) {
            Ok(()) => {
                self.metrics
                    .blocks_received_total
                    .fetch_add(1, Ordering::Relaxed);
                info!(node_id = %self.node_id, index, "Block received from peer");
                Ok(())
            }
            Err(e) => {
                self.metrics
                    .blocks_rejected_total
                    .fetch_add(1, Ordering::Relaxed);
                warn!(node_id = %self.node_id, index, error = %e, "Peer block rejected");
                Err(e.into())
            }
        }
    }

    pub fn peers(&self) -> &PeerTable {
        &self.peers
    }

    pub fn metrics(&self) -> SyncStats {
        self.metrics.snapshot()
    }

    fn queues(&self, handle: &Handle) -> &[PeerQueue] {
        self.queues.get_or_init(|| {
            self.peers
                .iter()
                .map(|peer| {
                    let (sender, receiver) = mpsc::unbounded_channel();
                    handle.spawn(run_peer_worker(
                        self.node_id.clone(),
                        self.client.clone(),
                        peer.clone(),
                        receiver,
                        self.metrics.clone(),
                    ));
                    PeerQueue {
                        peer: peer.clone(),
                        sender,
                    }
                })
                .collect()
        })
    }
}

impl BlockObserver for PeerSync {
    fn on_block_appended(&self, block: &Block) {
        self.broadcast(block);
    }
}

/// Push queued blocks to `peer` one at a time until the queue closes.
async fn run_peer_worker(
    node_id: String,
    client: PeerClient,
    peer: PeerInfo,
    mut receiver: mpsc::UnboundedReceiver<Block>,
    metrics: Arc<SyncMetrics>,
) {
    debug!(node_id = %node_id, peer = %peer.address, "Peer worker started");
    while let Some(block) = receiver.recv().await {
        push_to_peer(&node_id, &client, &peer, &block, &metrics).await;
    }
    debug!(node_id = %node_id, peer = %peer.address, "Peer worker stopped");
}

async fn push_to_peer(
    node_id: &str,
    client: &PeerClient,
    peer: &PeerInfo,
    block: &Block,
    metrics: &SyncMetrics,
) {
    match client.push_block(peer, block).await {
        Ok(()) => {
            metrics.blocks_pushed_total.fetch_add(1, Ordering::Relaxed);
            debug!(node_id, peer = %peer.address, index = block.index, "Block pushed");
        }
        Err(e) => {
            metrics.push_failures_total.fetch_add(1, Ordering::Relaxed);
            warn!(
                node_id,
                peer = %peer.address,
                index = block.index,
                error = %e,
                "Failed to push block to peer"
            );
        }
    }
}
