//! Key types with secure memory handling.
//!
//! [`DerivedKey`] is a capability: holding one lets you encrypt and decrypt,
//! nothing else. It cannot be cloned, serialized or read back as bytes from
//! outside this crate, and its memory is zeroized on drop.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use sealnote_common::{Error, Result};

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of the per-user KDF salt in bytes (128-bit).
pub const SALT_LENGTH: usize = 16;

/// Symmetric key derived from a user password.
///
/// Restricted to AES-GCM encryption and decryption of note fields. Share it
/// between tasks through an `Arc`; the bytes are wiped when the last
/// reference drops.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    pub(crate) fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// # Security
    /// Only the cipher in this crate may see the bytes.
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        self.key[..].ct_eq(&other.key[..]).into()
    }
}

impl Eq for DerivedKey {}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey([REDACTED])")
    }
}

/// Salt for key derivation.
///
/// Generated once at registration and stored by the auth collaborator. It is
/// a public KDF parameter, not a secret, and travels as 32 lowercase hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LENGTH]);

impl Salt {
    /// Generate a random salt from the OS CSPRNG.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut salt = [0u8; SALT_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        Self(salt)
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse a hex-encoded salt.
    ///
    /// # Errors
    /// - `InvalidInput` if the string is not hex or not exactly 16 bytes
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let bytes = hex::decode(encoded)
            .map_err(|e| Error::InvalidInput(format!("Salt is not valid hex: {}", e)))?;
        let salt: [u8; SALT_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
            Error::InvalidInput(format!(
                "Salt must be {} bytes, got {}",
                SALT_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(salt))
    }

    /// Encode as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Salt {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Salt {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Salt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_hex(&encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salt_generate() {
        let salt1 = Salt::generate();
        let salt2 = Salt::generate();

        // Random salts should be different
        assert_ne!(salt1.as_bytes(), salt2.as_bytes());
    }

    #[test]
    fn test_salt_hex_roundtrip() {
        let salt = Salt::from_hex("a1b2c3d4e5f60708a1b2c3d4e5f60708").unwrap();
        assert_eq!(salt.as_bytes()[0], 0xa1);
        assert_eq!(salt.to_hex(), "a1b2c3d4e5f60708a1b2c3d4e5f60708");
    }

    #[test]
    fn test_salt_rejects_malformed_hex() {
        assert!(matches!(
            Salt::from_hex("zz"),
            Err(Error::InvalidInput(_))
        ));
        // Odd length
        assert!(matches!(
            Salt::from_hex("abc"),
            Err(Error::InvalidInput(_))
        ));
        // Valid hex, wrong length
        assert!(matches!(
            Salt::from_hex("a1b2c3d4"),
            Err(Error::InvalidInput(_))
        ));
        assert!(Salt::from_hex("").is_err());
    }

    #[test]
    fn test_salt_serializes_as_hex() {
        let salt = Salt::from_bytes([0xab; SALT_LENGTH]);
        let json = serde_json::to_string(&salt).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(SALT_LENGTH)));

        let back: Salt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, salt);
    }

    #[test]
    fn test_derived_key_debug_is_redacted() {
        let key = DerivedKey::from_bytes([7u8; KEY_LENGTH]);
        assert_eq!(format!("{:?}", key), "DerivedKey([REDACTED])");
    }

    #[test]
    fn test_derived_key_equality() {
        let a = DerivedKey::from_bytes([1u8; KEY_LENGTH]);
        let b = DerivedKey::from_bytes([1u8; KEY_LENGTH]);
        let c = DerivedKey::from_bytes([2u8; KEY_LENGTH]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
