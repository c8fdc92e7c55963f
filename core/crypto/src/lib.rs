//! Cryptographic primitives for SealNote.
//!
//! This module provides:
//! - Key derivation using PBKDF2-HMAC-SHA256
//! - Authenticated encryption using AES-256-GCM
//! - Non-extractable key handles with automatic zeroization
//!
//! # Security Guarantees
//! - Derived keys never expose their bytes outside this crate
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged

pub mod aead;
pub mod kdf;
pub mod keys;

pub use aead::{decrypt, decrypt_with_nonce, encrypt, encrypt_with_nonce, EncryptedField, Nonce};
pub use kdf::{derive_key, PBKDF2_ITERATIONS};
pub use keys::{DerivedKey, Salt};
