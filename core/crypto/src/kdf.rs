//! Key derivation using PBKDF2-HMAC-SHA256.
//!
//! The derivation is deterministic: the same password and salt always yield
//! the same key, so a fresh session can recompute it instead of persisting it.
//! There is no verification step. A wrong password silently derives a
//! different key, which surfaces later as an authentication failure.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::keys::{DerivedKey, Salt, KEY_LENGTH};
use sealnote_common::{Error, Result};

/// PBKDF2 work factor. Changing it changes every derived key.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Derive an encryption key from a password and salt.
///
/// # Preconditions
/// - `password` must not be empty
/// - `salt` is the user's registration salt, supplied by the caller
///
/// # Postconditions
/// - Returns a non-extractable key restricted to encryption/decryption
/// - The derived key is deterministic given the same inputs
///
/// # Errors
/// - `InvalidInput` if password is empty
///
/// # Security
/// - Password is not stored or logged
/// - The intermediate buffer is zeroized after derivation
pub fn derive_key(password: &str, salt: &Salt) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(Error::InvalidInput("Password cannot be empty".to_string()));
    }

    let mut key_bytes = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut key_bytes,
    );

    let key = DerivedKey::from_bytes(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}
