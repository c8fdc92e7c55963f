//! Common error types for SealNote.

use thiserror::Error;

/// Top-level error type for SealNote operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed password, salt, nonce or request. Nothing was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The authentication tag did not verify.
    ///
    /// The record cannot be recovered with the key at hand: the key is wrong,
    /// the ciphertext is corrupted, or the nonce does not belong to it.
    #[error("Authentication failure: ciphertext could not be verified")]
    AuthenticationFailure,

    /// A cryptographic operation was attempted with no derived key held.
    #[error("No encryption key is present for this session")]
    KeyAbsent,

    /// Cryptographic primitive failed for a reason other than tag mismatch.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Operation not permitted.
    #[error("Not permitted: {0}")]
    NotPermitted(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Conflict detected.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
