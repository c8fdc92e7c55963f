//! Authenticated encryption using AES-256-GCM.
//!
//! Each field is sealed under the derived key and a 96-bit nonce. The 16-byte
//! GCM tag is appended to the ciphertext and verified on every decrypt.
//! Random nonces are safe up to the 96-bit birthday bound, so every call to
//! [`encrypt`] or [`Nonce::generate`] draws a fresh one from the OS CSPRNG.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::keys::DerivedKey;
use sealnote_common::{Error, Result};

/// Nonce size for AES-GCM (12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// A 96-bit AES-GCM nonce.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Draw a fresh random nonce.
    pub fn generate() -> Self {
        let generated = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut bytes = [0u8; NONCE_SIZE];
        bytes.copy_from_slice(&generated);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// # Errors
    /// - `InvalidInput` if `bytes` is not exactly 12 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let nonce: [u8; NONCE_SIZE] = bytes.try_into().map_err(|_| {
            Error::InvalidInput(format!(
                "Nonce must be {} bytes, got {}",
                NONCE_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(nonce))
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| Error::InvalidInput(format!("Nonce is not valid base64: {}", e)))?;
        Self::from_slice(&bytes)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", self.to_base64())
    }
}

impl Serialize for Nonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Ciphertext (including tag) together with the nonce it was sealed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedField {
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
    pub nonce: Nonce,
}

mod base64_bytes {
    use super::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

fn cipher_for(key: &DerivedKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypt plaintext under a freshly generated nonce.
///
/// # Postconditions
/// - `ciphertext` length is plaintext length + TAG_SIZE
/// - Every call uses a new random nonce
///
/// # Errors
/// - Returns `Crypto` if the primitive rejects the input
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> Result<EncryptedField> {
    let nonce = Nonce::generate();
    let ciphertext = encrypt_with_nonce(key, &nonce, plaintext)?;
    Ok(EncryptedField { ciphertext, nonce })
}

/// Decrypt and verify a field.
///
/// # Errors
/// - `AuthenticationFailure` on wrong key, corrupted ciphertext or mismatched
///   nonce. No partial plaintext is returned.
pub fn decrypt(key: &DerivedKey, field: &EncryptedField) -> Result<Vec<u8>> {
    decrypt_with_nonce(key, &field.nonce, &field.ciphertext)
}

/// Encrypt plaintext with a caller-supplied nonce.
///
/// # Warning
/// Using the same nonce twice with the same key for different plaintexts
/// breaks confidentiality. The record codec shares one nonce between the two
/// fields of a single record version and never across versions.
pub fn encrypt_with_nonce(key: &DerivedKey, nonce: &Nonce, plaintext: &[u8]) -> Result<Vec<u8>> {
    cipher_for(key)
        .encrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))
}

/// Decrypt ciphertext with a specific nonce.
pub fn decrypt_with_nonce(key: &DerivedKey, nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(Error::AuthenticationFailure);
    }

    cipher_for(key)
        .decrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), ciphertext)
        .map_err(|_| Error::AuthenticationFailure)
}
