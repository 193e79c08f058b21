use authchain_core::{Config, Ledger, SharedLedger};
use authchain_identity::AuthProtocol;
use authchain_mesh::{ConsensusEngine, PeerSync};
use std::sync::Arc;

/// Components of one running node, shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub node_id: String,
    pub protocol: Arc<AuthProtocol>,
    pub sync: Arc<PeerSync>,
    pub consensus: Arc<ConsensusEngine>,
}

impl AppState {
    /// Wire a fresh genesis-only ledger to the protocol, peer sync and
    /// consensus. Peer sync observes every block the protocol appends.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let node_id = config.node.node_id.clone();
        let ledger = Ledger::shared();

        let sync = Arc::new(PeerSync::from_config(
            node_id.as_str(),
            ledger.clone(),
            &config.peers,
        )?);
        let consensus = Arc::new(ConsensusEngine::from_config(
            node_id.as_str(),
            ledger.clone(),
            &config.peers,
            &config.consensus,
        )?);
        let protocol =
            Arc::new(AuthProtocol::new(node_id.as_str(), ledger).with_observer(sync.clone()));

        Ok(Self {
            node_id,
            protocol,
            sync,
            consensus,
        })
    }

    pub fn ledger(&self) -> &SharedLedger {
        self.protocol.ledger()
    }
}
