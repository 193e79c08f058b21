//! Identity event schema recorded in ledger blocks.
//!
//! Every block carries exactly one event. Events are tagged by `action` on
//! the wire and are immutable once embedded in a block.

use serde::{Deserialize, Serialize};

/// Event payload of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IdentityEvent {
    /// Payload of the fixed index-0 block
    Genesis,
    /// A username was bound to a freshly generated key pair
    Registration {
        /// Registered username
        username: String,
        /// Hex public key issued to the user
        public_key: String,
    },
    /// A signed message was verified for a user
    Authentication {
        /// Authenticated username
        username: String,
        /// Message that was signed
        message: String,
        /// Hex signature that was accepted
        signature: String,
    },
    /// A server-issued challenge was signed and verified
    ZkAuthentication {
        /// Authenticated username
        username: String,
        /// Challenge consumed by the verification
        challenge: String,
        /// Hex signature over the challenge
        signature: String,
    },
}

impl IdentityEvent {
    /// Wire tag of the event.
    pub fn action(&self) -> &'static str {
        match self {
            IdentityEvent::Genesis => "genesis",
            IdentityEvent::Registration { .. } => "registration",
            IdentityEvent::Authentication { .. } => "authentication",
            IdentityEvent::ZkAuthentication { .. } => "zk_authentication",
        }
    }

    /// Username the event refers to, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            IdentityEvent::Genesis => None,
            IdentityEvent::Registration { username, .. }
            | IdentityEvent::Authentication { username, .. }
            | IdentityEvent::ZkAuthentication { username, .. } => Some(username),
        }
    }

    /// Feeds the canonical encoding of the event into `hasher`.
    ///
    /// The action tag comes first, followed by every field in declaration
    /// order, each prefixed with its length so that field boundaries cannot
    /// be shifted without changing the digest.
    pub fn hash_into(&self, hasher: &mut blake3::Hasher) {
        update_field(hasher, self.action());
        match self {
            IdentityEvent::Genesis => {}
            IdentityEvent::Registration {
                username,
                public_key,
            } => {
                update_field(hasher, username);
                update_field(hasher, public_key);
            }
            IdentityEvent::Authentication {
                username,
                message,
                signature,
            } => {
                update_field(hasher, username);
                update_field(hasher, message);
                update_field(hasher, signature);
            }
            IdentityEvent::ZkAuthentication {
                username,
                challenge,
                signature,
            } => {
                update_field(hasher, username);
                update_field(hasher, challenge);
                update_field(hasher, signature);
            }
        }
    }
}

fn update_field(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}
