//! Identity registration and authentication for AuthChain nodes.
//!
//! This crate binds usernames to key pairs and runs the authentication
//! protocol whose outcomes are recorded in the node's ledger.
//!
//! # Core Concepts
//!
//! - **Identity Registry**: username → key pair, unique per node
//! - **Challenge Store**: one outstanding single-use nonce per username
//! - **Auth Protocol**: registration, direct authentication and
//!   challenge–response authentication
//!
//! # Lifecycle
//!
//! A username moves from unregistered to registered exactly once; there is
//! no de-registration. Every registration and every accepted authentication
//! appends one block to the ledger.

pub mod challenge;
pub mod error;
pub mod protocol;
pub mod registry;

pub use challenge::{ChallengeStore, CHALLENGE_LENGTH};
pub use error::{IdentityError, IdentityResult};
pub use protocol::{AuthOutcome, AuthProtocol};
pub use registry::IdentityRegistry;
