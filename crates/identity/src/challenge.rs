//! Single-use authentication challenges.
//!
//! One outstanding challenge per username. Issuing again overwrites the
//! previous challenge; consuming removes it. Challenges do not expire.

use crate::error::{IdentityError, IdentityResult};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use std::collections::HashMap;

/// Number of alphanumeric characters in a challenge.
pub const CHALLENGE_LENGTH: usize = 32;

/// Outstanding challenges indexed by username.
#[derive(Debug, Default)]
pub struct ChallengeStore {
    outstanding: HashMap<String, String>,
}

impl ChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh challenge for `username`, replacing any outstanding one.
    pub fn issue(&mut self, username: &str) -> String {
        let challenge: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(CHALLENGE_LENGTH)
            .map(char::from)
            .collect();

        self.outstanding
            .insert(username.to_string(), challenge.clone());
        challenge
    }

    /// Remove and return the outstanding challenge for `username`.
    pub fn consume(&mut self, username: &str) -> IdentityResult<String> {
        self.outstanding
            .remove(username)
            .ok_or_else(|| IdentityError::ChallengeNotFound {
                username: username.to_string(),
            })
    }

    pub fn outstanding(&self, username: &str) -> Option<&str> {
        self.outstanding.get(username).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }
}
