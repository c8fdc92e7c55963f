//! Wire representation exchanged with the storage collaborator.
//!
//! Every field that carries ciphertext or a nonce is a [`Base64Bytes`], which
//! travels as a standard padded base64 string. The storage side treats these
//! as opaque blobs; only non-secret metadata (folder, tags, archive flag,
//! timestamps) is meaningful to it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::types::{FolderId, NoteId, TagId};
use crate::{Error, Result};

/// Color assigned to folders and tags created without one.
pub const DEFAULT_COLOR: &str = "#3b82f6";

/// Opaque bytes encoded as base64 at the wire boundary.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Base64Bytes(Vec<u8>);

impl Base64Bytes {
    /// Wrap raw bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Decode a base64 string.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        STANDARD
            .decode(encoded)
            .map(Self)
            .map_err(|e| Error::Serialization(format!("Invalid base64: {}", e)))
    }

    /// Encode as a base64 string.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the raw bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Base64Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Base64Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Base64Bytes({} bytes)", self.0.len())
    }
}

impl Serialize for Base64Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Base64Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// Read access to the encrypted portion of a note record.
///
/// Implemented by both the stored record and the creation request, so a
/// record can be opened before or after it round-trips through storage.
pub trait EncryptedRecord {
    fn encrypted_title(&self) -> &[u8];
    fn encrypted_content(&self) -> &[u8];
    /// The nonce shared by title and content.
    fn iv(&self) -> &[u8];
}

/// A note as stored and returned by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedNote {
    pub id: NoteId,
    pub encrypted_title: Base64Bytes,
    pub encrypted_content: Base64Bytes,
    pub iv: Base64Bytes,
    #[serde(default)]
    pub folder_id: Option<FolderId>,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EncryptedRecord for EncryptedNote {
    fn encrypted_title(&self) -> &[u8] {
        self.encrypted_title.as_bytes()
    }

    fn encrypted_content(&self) -> &[u8] {
        self.encrypted_content.as_bytes()
    }

    fn iv(&self) -> &[u8] {
        self.iv.as_bytes()
    }
}

/// Body of `POST /notes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub encrypted_title: Base64Bytes,
    pub encrypted_content: Base64Bytes,
    pub iv: Base64Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<TagId>,
}

impl NewNote {
    /// Reject requests missing any encrypted field.
    pub fn validate(&self) -> Result<()> {
        if self.encrypted_title.is_empty()
            || self.encrypted_content.is_empty()
            || self.iv.is_empty()
        {
            return Err(Error::InvalidInput(
                "encryptedTitle, encryptedContent and iv are required".to_string(),
            ));
        }
        Ok(())
    }
}

impl EncryptedRecord for NewNote {
    fn encrypted_title(&self) -> &[u8] {
        self.encrypted_title.as_bytes()
    }

    fn encrypted_content(&self) -> &[u8] {
        self.encrypted_content.as_bytes()
    }

    fn iv(&self) -> &[u8] {
        self.iv.as_bytes()
    }
}

/// Body of `PUT /notes/{id}`.
///
/// Absent fields are left untouched. `folder_id: Some(None)` detaches the
/// note from its folder and travels as an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_title: Option<Base64Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_content: Option<Base64Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<Base64Bytes>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "explicit_null"
    )]
    pub folder_id: Option<Option<FolderId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<TagId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
}

impl NotePatch {
    /// Patch that only flips the archive flag.
    pub fn archive(archived: bool) -> Self {
        Self {
            is_archived: Some(archived),
            ..Self::default()
        }
    }

    /// Move the note into `folder`, or out of any folder with `None`.
    pub fn with_folder(mut self, folder: Option<FolderId>) -> Self {
        self.folder_id = Some(folder);
        self
    }

    /// Replace the note's tag set.
    pub fn with_tags(mut self, tags: Vec<TagId>) -> Self {
        self.tag_ids = Some(tags);
        self
    }

    /// Whether the patch replaces the encrypted payload.
    pub fn is_encrypted_update(&self) -> bool {
        self.encrypted_title.is_some() || self.encrypted_content.is_some() || self.iv.is_some()
    }

    /// Encrypted fields travel together: one nonce per record version.
    pub fn validate(&self) -> Result<()> {
        let present = [
            self.encrypted_title.is_some(),
            self.encrypted_content.is_some(),
            self.iv.is_some(),
        ];
        if present.iter().any(|p| *p) && !present.iter().all(|p| *p) {
            return Err(Error::InvalidInput(
                "encryptedTitle, encryptedContent and iv must be updated together".to_string(),
            ));
        }
        Ok(())
    }
}

fn explicit_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Filter for `GET /notes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteQuery {
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<TagId>,
}

impl NoteQuery {
    /// Query for unarchived notes.
    pub fn active() -> Self {
        Self::default()
    }

    /// Query for archived notes.
    pub fn archived() -> Self {
        Self {
            archived: true,
            ..Self::default()
        }
    }

    pub fn in_folder(mut self, folder: FolderId) -> Self {
        self.folder_id = Some(folder);
        self
    }

    pub fn with_tag(mut self, tag: TagId) -> Self {
        self.tag_id = Some(tag);
        self
    }

    /// Check whether a stored note satisfies this filter.
    pub fn matches(&self, note: &EncryptedNote) -> bool {
        if note.is_archived != self.archived {
            return false;
        }
        if let Some(folder) = &self.folder_id {
            if note.folder_id.as_ref() != Some(folder) {
                return false;
            }
        }
        if let Some(tag) = &self.tag_id {
            if !note.tag_ids.contains(tag) {
                return false;
            }
        }
        true
    }
}

/// A folder. Names are plaintext metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// A tag. Names are plaintext metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}
