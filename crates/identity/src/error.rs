//! Error types for AuthChain identity operations.

use thiserror::Error;

/// Errors that can occur in identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Username is already bound to a key pair
    #[error("Username already registered: {username}")]
    AlreadyRegistered { username: String },

    /// Username is not registered
    #[error("User not found: {username}")]
    UserNotFound { username: String },

    /// Username is not registered or has no outstanding challenge
    #[error("User or challenge not found: {username}")]
    UserOrChallengeNotFound { username: String },

    /// No outstanding challenge for the username
    #[error("No outstanding challenge for: {username}")]
    ChallengeNotFound { username: String },

    /// Key errors
    #[error("Key error: {0}")]
    Key(#[from] authchain_crypto::KeyError),

    /// Shared state lock poisoned by a panicking writer
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
