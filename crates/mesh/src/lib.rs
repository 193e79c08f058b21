//! AuthChain Mesh - Block Propagation and Chain Consensus
//!
//! Keeps the ledgers of a small, statically configured set of nodes in step.
//!
//! # Core Components
//!
//! - **Peer Table**: normalized base URLs of the configured peers
//! - **Peer Sync**: pushes every locally created block to all peers and
//!   accepts blocks pushed by them
//! - **Consensus Engine**: on demand, fetches every peer's chain and adopts
//!   the longest one
//!
//! # Wire Protocol
//!
//! - `POST <peer>/sync_block` with `{"block": Block}`
//! - `GET <peer>/chain` answering `{"length": n, "chain": [Block]}`
//!
//! Peer failures are logged and counted, never retried.

pub mod client;
pub mod consensus;
pub mod error;
pub mod messages;
pub mod peer;
pub mod sync;

pub use client::PeerClient;
pub use consensus::{choose_chain, ConsensusEngine, ReconcileReport};
pub use error::{MeshError, MeshResult};
pub use messages::{ChainResponse, SyncBlockRequest, CHAIN_PATH, SYNC_BLOCK_PATH};
pub use peer::{PeerInfo, PeerTable};
pub use sync::{PeerSync, SyncMetrics, SyncStats};
