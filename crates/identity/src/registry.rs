//! Username to key pair registry.

use crate::error::{IdentityError, IdentityResult};
use authchain_crypto::{KeyDirectory, KeyPair, PrivateKey, PublicKey};
use std::collections::HashMap;

/// Identity material of one node, indexed by username.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    identities: HashMap<String, KeyPair>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `username` to `key_pair`. Existing bindings are never replaced.
    pub fn insert(&mut self, username: &str, key_pair: KeyPair) -> IdentityResult<()> {
        if self.identities.contains_key(username) {
            return Err(IdentityError::AlreadyRegistered {
                username: username.to_string(),
            });
        }
        self.identities.insert(username.to_string(), key_pair);
        Ok(())
    }

    pub fn get(&self, username: &str) -> Option<&KeyPair> {
        self.identities.get(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.identities.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

impl KeyDirectory for IdentityRegistry {
    fn private_key_for(&self, public_key: &PublicKey) -> Option<&PrivateKey> {
        self.identities
            .values()
            .find(|pair| &pair.public_key == public_key)
            .map(|pair| &pair.private_key)
    }
}
