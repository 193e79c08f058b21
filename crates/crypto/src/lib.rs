//! Key generation, signing and verification for AuthChain identities.
//!
//! This crate provides the KeyService used by the identity protocol:
//!
//! - **Key Pairs**: 32-byte random private keys with a SHA3-256 derived
//!   public key
//! - **Signing**: HMAC-SHA3-256 message authentication codes keyed with the
//!   private key
//! - **Verification**: recomputation of the expected MAC from the private key
//!   on record for a public key
//!
//! # Security Model
//!
//! The scheme is a simulated asymmetric one. Verification needs the signer's
//! private key, which the verifier looks up through a [`KeyDirectory`]. It
//! proves possession of a server-held secret, not a public-key signature.
//! [`KeyDirectory`] and the free functions in [`keys`] are the boundary to
//! swap for a real signature scheme.
//!
//! - Private keys are zeroized on drop and never printed by `Debug`
//! - MAC comparison is constant-time

pub mod keys;

pub use keys::{
    derive_public_key, generate_key_pair, sign, verify, KeyDirectory, KeyError, KeyPair,
    PrivateKey, PublicKey, PRIVATE_KEY_LEN,
};
