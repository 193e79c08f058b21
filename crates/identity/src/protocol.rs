//! Authentication protocol.
//!
//! Orchestrates registration, direct authentication and challenge–response
//! authentication on top of the key service, the identity registry, the
//! challenge store and the ledger.
//!
//! # State Machine (per username)
//!
//! ```text
//! Unregistered
//!     ↓ (register)
//! Registered ──┬─ sign / authenticate
//!              └─ begin_challenge → complete_challenge (single use)
//! ```
//!
//! # Locking
//!
//! The registry and the challenge store share one mutex, so issuing and
//! consuming a challenge are atomic per node. Ledger appends take the ledger
//! write lock while the identity mutex is held; the reverse order is never
//! used. The block observer runs after the ledger lock is released but
//! before the identity mutex is, so it sees blocks in ledger order and must
//! not call back into the protocol.

use crate::challenge::ChallengeStore;
use crate::error::{IdentityError, IdentityResult};
use crate::registry::IdentityRegistry;
use authchain_core::{Block, BlockObserver, IdentityEvent, SharedLedger};
use authchain_crypto::{generate_key_pair, sign, verify, PublicKey};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Outcome of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthOutcome {
    Accepted,
    Rejected,
}

impl AuthOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AuthOutcome::Accepted)
    }
}

#[derive(Debug, Default)]
struct IdentityState {
    registry: IdentityRegistry,
    challenges: ChallengeStore,
}

/// Authentication protocol of one node.
pub struct AuthProtocol {
    node_id: String,
    state: Mutex<IdentityState>,
    ledger: SharedLedger,
    observer: Option<Arc<dyn BlockObserver>>,
}

impl AuthProtocol {
    pub fn new(node_id: impl Into<String>, ledger: SharedLedger) -> Self {
        Self {
            node_id: node_id.into(),
            state: Mutex::new(IdentityState::default()),
            ledger,
            observer: None,
        }
    }

    /// Notify `observer` of every block this protocol appends.
    pub fn with_observer(mut self, observer: Arc<dyn BlockObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Register `username` with a freshly generated key pair.
    pub fn register(&self, username: &str) -> IdentityResult<PublicKey> {
        let mut state = self.lock_state()?;
        if state.registry.contains(username) {
            warn!(node_id = %self.node_id, username, "Registration rejected: username taken");
            return Err(IdentityError::AlreadyRegistered {
                username: username.to_string(),
            });
        }

        let key_pair = generate_key_pair();
        let public_key = key_pair.public_key.clone();

        // Stored only once the registration block is in the ledger
        let block = self.append(IdentityEvent::Registration {
            username: username.to_string(),
            public_key: public_key.to_string(),
        })?;
        state.registry.insert(username, key_pair)?;

        info!(
            node_id = %self.node_id,
            username,
            index = block.index,
            "Identity registered"
        );
        self.notify(&block);
        Ok(public_key)
    }

    /// Sign `message` with the private key of `username`.
    ///
    /// Signing is not recorded in the ledger.
    pub fn sign(&self, username: &str, message: &str) -> IdentityResult<String> {
        let state = self.lock_state()?;
        let key_pair = state
            .registry
            .get(username)
            .ok_or_else(|| IdentityError::UserNotFound {
                username: username.to_string(),
            })?;

        let signature = sign(&key_pair.private_key, message)?;
        debug!(node_id = %self.node_id, username, "Message signed");
        Ok(signature)
    }

    /// Verify `signature` over `message` for `username`.
    ///
    /// Accepted attempts append an authentication event; rejected attempts
    /// leave the ledger untouched.
    pub fn authenticate(
        &self,
        username: &str,
        message: &str,
        signature: &str,
    ) -> IdentityResult<AuthOutcome> {
        let state = self.lock_state()?;
        let key_pair = state
            .registry
            .get(username)
            .ok_or_else(|| IdentityError::UserNotFound {
                username: username.to_string(),
            })?;

        if !verify(signature, &key_pair.public_key, message, &state.registry) {
            warn!(node_id = %self.node_id, username, "Authentication rejected");
            return Ok(AuthOutcome::Rejected);
        }

        let block = self.append(IdentityEvent::Authentication {
            username: username.to_string(),
            message: message.to_string(),
            signature: signature.to_string(),
        })?;

        info!(
            node_id = %self.node_id,
            username,
            index = block.index,
            "Authentication accepted"
        );
        self.notify(&block);
        Ok(AuthOutcome::Accepted)
    }

    /// Issue a single-use challenge for `username`.
    pub fn begin_challenge(&self, username: &str) -> IdentityResult<String> {
        let mut state = self.lock_state()?;
        if !state.registry.contains(username) {
            return Err(IdentityError::UserNotFound {
                username: username.to_string(),
            });
        }

        let challenge = state.challenges.issue(username);
        debug!(node_id = %self.node_id, username, challenge = %challenge, "Challenge issued");
        Ok(challenge)
    }

    /// Verify `signature` over the outstanding challenge of `username`.
    ///
    /// The challenge is consumed before verification, so a second attempt
    /// fails with `UserOrChallengeNotFound` whatever the first outcome was.
    pub fn complete_challenge(
        &self,
        username: &str,
        signature: &str,
    ) -> IdentityResult<AuthOutcome> {
        let mut state = self.lock_state()?;
        let not_found = || IdentityError::UserOrChallengeNotFound {
            username: username.to_string(),
        };

        let public_key = state
            .registry
            .get(username)
            .map(|pair| pair.public_key.clone())
            .ok_or_else(not_found)?;
        let challenge = state
            .challenges
            .consume(username)
            .map_err(|_| not_found())?;

        if !verify(signature, &public_key, &challenge, &state.registry) {
            warn!(node_id = %self.node_id, username, "Challenge response rejected");
            return Ok(AuthOutcome::Rejected);
        }

        let block = self.append(IdentityEvent::ZkAuthentication {
            username: username.to_string(),
            challenge,
            signature: signature.to_string(),
        })?;

        info!(
            node_id = %self.node_id,
            username,
            index = block.index,
            "Challenge response accepted"
        );
        self.notify(&block);
        Ok(AuthOutcome::Accepted)
    }

    /// Public key registered for `username`, if any.
    pub fn public_key_of(&self, username: &str) -> IdentityResult<Option<PublicKey>> {
        let state = self.lock_state()?;
        Ok(state
            .registry
            .get(username)
            .map(|pair| pair.public_key.clone()))
    }

    /// Number of registered identities.
    pub fn user_count(&self) -> IdentityResult<usize> {
        Ok(self.lock_state()?.registry.len())
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    fn lock_state(&self) -> IdentityResult<MutexGuard<'_, IdentityState>> {
        self.state
            .lock()
            .map_err(|e| IdentityError::LockPoisoned(format!("identity state: {}", e)))
    }

    fn append(&self, event: IdentityEvent) -> IdentityResult<Block> {
        let mut ledger = self
            .ledger
            .write()
            .map_err(|e| IdentityError::LockPoisoned(format!("ledger: {}", e)))?;
        Ok(ledger.add_block(event))
    }

    fn notify(&self, block: &Block) {
        if let Some(observer) = &self.observer {
            observer.on_block_appended(block);
        }
    }
}
