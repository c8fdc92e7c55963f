//! Client configuration.

use serde::{Deserialize, Serialize};

use sealnote_common::{Error, Result};

/// Text shown in place of both fields of a note that failed verification.
pub const DEFAULT_UNREADABLE_PLACEHOLDER: &str = "[Failed to decrypt]";

/// Default number of records decrypted in parallel.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;

/// Notes client configuration.
///
/// The KDF work factor is not configurable; see
/// [`sealnote_crypto::PBKDF2_ITERATIONS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct NotesConfig {
    /// Maximum records decrypted concurrently when opening a list.
    pub batch_concurrency: usize,
    /// Placeholder for title and content of an unreadable record.
    pub unreadable_placeholder: String,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            unreadable_placeholder: DEFAULT_UNREADABLE_PLACEHOLDER.to_string(),
        }
    }
}

impl NotesConfig {
    /// Check value ranges.
    ///
    /// # Errors
    /// - `InvalidInput` if `batch_concurrency` is zero
    pub fn validate(&self) -> Result<()> {
        if self.batch_concurrency == 0 {
            return Err(Error::InvalidInput(
                "batch_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize and validate configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
