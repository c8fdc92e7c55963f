//! Key session management.
//!
//! A [`KeySession`] holds the derived key in memory for the lifetime of one
//! client session. The key is never persisted; only a non-secret marker is
//! written through a [`MarkerStore`]. The session is passed explicitly to
//! whatever needs the key, there is no ambient global.

use std::sync::Arc;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::marker::{MarkerStore, MemoryMarker};
use sealnote_common::{Error, Result};
use sealnote_crypto::{derive_key, DerivedKey, Salt};

/// State of the key session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// No key held. Every crypto operation fails with `KeyAbsent`.
    Absent,
    /// Key derived and available.
    Present,
}

/// Volatile holder of the session's derived key.
///
/// Whether the key is *correct* is not tracked here; a wrong key shows up
/// lazily as authentication failures when records are opened.
pub struct KeySession {
    key: Option<Arc<DerivedKey>>,
    marker: Arc<dyn MarkerStore>,
}

impl KeySession {
    /// Create an empty session that records its marker in `marker`.
    pub fn new(marker: Arc<dyn MarkerStore>) -> Self {
        Self { key: None, marker }
    }

    /// Create an empty session with a private in-memory marker.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryMarker::new()))
    }

    /// Hold `key` for the rest of the session.
    ///
    /// # Postconditions
    /// - State is Present
    /// - The key-expected marker is set
    pub fn set(&mut self, key: DerivedKey) {
        self.key = Some(Arc::new(key));
        self.marker.mark();
        info!("Encryption key set");
    }

    /// Derive the key from `password` and `salt` and hold it.
    ///
    /// Derivation runs on the blocking pool.
    ///
    /// # Errors
    /// - `InvalidInput` if the password is empty
    /// - `Crypto` if the derivation task could not complete
    pub async fn unlock(&mut self, password: &str, salt: &Salt) -> Result<()> {
        if password.is_empty() {
            return Err(Error::InvalidInput("Password cannot be empty".to_string()));
        }

        let password = Zeroizing::new(password.to_string());
        let salt = *salt;
        let key = tokio::task::spawn_blocking(move || derive_key(&password, &salt))
            .await
            .map_err(|e| Error::Crypto(format!("Key derivation task failed: {}", e)))??;

        self.set(key);
        Ok(())
    }

    /// Get the key, if present.
    pub fn get(&self) -> Option<Arc<DerivedKey>> {
        self.key.clone()
    }

    /// Get the key or fail with `KeyAbsent`.
    ///
    /// Call this before every cryptographic operation.
    pub fn require(&self) -> Result<Arc<DerivedKey>> {
        self.key.clone().ok_or(Error::KeyAbsent)
    }

    /// Drop the key and remove the marker.
    ///
    /// Dropping the session instead loses the key but leaves the marker, which
    /// is how a reload shows up to the next session.
    ///
    /// Performs no network calls. Tasks still holding an `Arc` to the key
    /// finish their work; the bytes are zeroized when the last one drops.
    pub fn clear(&mut self) {
        if self.key.take().is_some() {
            debug!("Encryption key cleared");
        }
        self.marker.unmark();
    }

    /// Get the current state.
    pub fn state(&self) -> KeyState {
        if self.key.is_some() {
            KeyState::Present
        } else {
            KeyState::Absent
        }
    }

    /// Check if a key is held.
    pub fn is_present(&self) -> bool {
        self.state() == KeyState::Present
    }

    /// True when the marker expects a key but none is held, e.g. after an
    /// unexpected reload. The caller should send the user back to sign in.
    pub fn needs_reauth(&self) -> bool {
        self.key.is_none() && self.marker.is_marked()
    }
}

impl std::fmt::Debug for KeySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySession")
            .field("state", &self.state())
            .finish()
    }
}
