//! Simulated key pairs and message authentication.
//!
//! A private key is 32 random bytes; the public key is the lowercase hex
//! SHA3-256 digest of it. Signatures are lowercase hex HMAC-SHA3-256 tags.

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;
use thiserror::Error;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha3 = Hmac<Sha3_256>;

/// Length of a private key in bytes.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Errors that can occur in key operations.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid key length: {actual} (expected {expected})")]
    InvalidLength { expected: usize, actual: usize },

    #[error("MAC initialization failed: {0}")]
    Mac(String),
}

/// Secret half of a key pair.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; PRIVATE_KEY_LEN]);

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let key: [u8; PRIVATE_KEY_LEN] =
            bytes.try_into().map_err(|_| KeyError::InvalidLength {
                expected: PRIVATE_KEY_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Public half of a key pair, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(String);

impl PublicKey {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A generated identity key pair.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

impl KeyPair {
    /// Rebuild a key pair from existing private key material.
    pub fn from_private_key(private_key: PrivateKey) -> Self {
        let public_key = derive_public_key(&private_key);
        Self {
            public_key,
            private_key,
        }
    }
}

/// Source of the private keys needed to verify signatures.
pub trait KeyDirectory {
    /// Private key on record whose derived public key equals `public_key`.
    fn private_key_for(&self, public_key: &PublicKey) -> Option<&PrivateKey>;
}

impl KeyDirectory for [KeyPair] {
    fn private_key_for(&self, public_key: &PublicKey) -> Option<&PrivateKey> {
        self.iter()
            .find(|pair| &pair.public_key == public_key)
            .map(|pair| &pair.private_key)
    }
}

/// Generate a fresh key pair from the OS random source.
pub fn generate_key_pair() -> KeyPair {
    let mut bytes = [0u8; PRIVATE_KEY_LEN];
    OsRng.fill_bytes(&mut bytes);
    let private_key = PrivateKey(bytes);
    bytes.zeroize();

    KeyPair::from_private_key(private_key)
}

/// Derive the public key of `private_key`.
pub fn derive_public_key(private_key: &PrivateKey) -> PublicKey {
    PublicKey(hex::encode(Sha3_256::digest(private_key.as_bytes())))
}

fn keyed_mac(private_key: &PrivateKey, message: &str) -> Result<HmacSha3, KeyError> {
    let mut mac = HmacSha3::new_from_slice(private_key.as_bytes())
        .map_err(|e| KeyError::Mac(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(mac)
}

/// Sign `message` with `private_key`, returning a lowercase hex tag.
///
/// Deterministic for a given key and message.
pub fn sign(private_key: &PrivateKey, message: &str) -> Result<String, KeyError> {
    let mac = keyed_mac(private_key, message)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify `candidate` as the signature of `message` by the owner of `public_key`.
///
/// Returns false when no private key is on record for `public_key`, when the
/// candidate is not valid hex, or when the tags differ.
pub fn verify<D: KeyDirectory + ?Sized>(
    candidate: &str,
    public_key: &PublicKey,
    message: &str,
    directory: &D,
) -> bool {
    let Some(private_key) = directory.private_key_for(public_key) else {
        debug!(public_key = %public_key, "No key on record for public key");
        return false;
    };

    let Ok(candidate_bytes) = hex::decode(candidate) else {
        return false;
    };

    match keyed_mac(private_key, message) {
        Ok(mac) => mac.verify_slice(&candidate_bytes).is_ok(),
        Err(_) => false,
    }
}
