//! Encrypted note records.
//!
//! A note version is sealed under one fresh nonce shared by its title and its
//! content. Every create and every update mints a new nonce, so a nonce is
//! never reused across versions of the same note.

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::warn;

use sealnote_common::{
    Base64Bytes, EncryptedNote, EncryptedRecord, Error, FolderId, NewNote, NoteId, NotePatch,
    Result, TagId,
};
use sealnote_crypto::{decrypt_with_nonce, encrypt_with_nonce, DerivedKey, Nonce};

/// Title and content sealed under one nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedNote {
    pub encrypted_title: Vec<u8>,
    pub encrypted_content: Vec<u8>,
    pub nonce: Nonce,
}

impl SealedNote {
    /// Build the creation request.
    pub fn into_new_note(self, folder_id: Option<FolderId>, tag_ids: Vec<TagId>) -> NewNote {
        NewNote {
            encrypted_title: Base64Bytes::new(self.encrypted_title),
            encrypted_content: Base64Bytes::new(self.encrypted_content),
            iv: Base64Bytes::new(self.nonce.as_bytes().to_vec()),
            folder_id,
            tag_ids,
        }
    }

    /// Build an update that replaces the whole encrypted payload.
    pub fn into_patch(self) -> NotePatch {
        NotePatch {
            encrypted_title: Some(Base64Bytes::new(self.encrypted_title)),
            encrypted_content: Some(Base64Bytes::new(self.encrypted_content)),
            iv: Some(Base64Bytes::new(self.nonce.as_bytes().to_vec())),
            ..NotePatch::default()
        }
    }
}

/// Verified plaintext of a note.
#[derive(Clone, PartialEq, Eq)]
pub struct OpenedNote {
    pub title: String,
    pub content: String,
}

impl fmt::Debug for OpenedNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OpenedNote(title: {} bytes, content: {} bytes)",
            self.title.len(),
            self.content.len()
        )
    }
}

/// Seal a note's title and content for storage.
///
/// # Postconditions
/// - Both fields are encrypted under the same, freshly generated nonce
///
/// # Errors
/// - `Crypto` if the cipher rejects the input
pub fn seal_note(title: &str, content: &str, key: &DerivedKey) -> Result<SealedNote> {
    let nonce = Nonce::generate();
    let encrypted_title = encrypt_with_nonce(key, &nonce, title.as_bytes())?;
    let encrypted_content = encrypt_with_nonce(key, &nonce, content.as_bytes())?;

    Ok(SealedNote {
        encrypted_title,
        encrypted_content,
        nonce,
    })
}

fn open_field(key: &DerivedKey, nonce: &Nonce, ciphertext: &[u8]) -> Result<String> {
    let plaintext = decrypt_with_nonce(key, nonce, ciphertext)?;
    String::from_utf8(plaintext)
        .map_err(|_| Error::Serialization("Decrypted field is not UTF-8".to_string()))
}

/// Open a sealed note.
///
/// Title and content are verified independently under the record's single
/// nonce. If either fails the record as a whole is reported as failed; no
/// verified field is returned next to an unverified one.
///
/// # Errors
/// - `InvalidInput` if the stored nonce is not 12 bytes
/// - `AuthenticationFailure` if a field does not verify
/// - `Serialization` if a verified field is not UTF-8
pub fn open_note<R: EncryptedRecord + ?Sized>(record: &R, key: &DerivedKey) -> Result<OpenedNote> {
    let nonce = Nonce::from_slice(record.iv())?;

    let title = open_field(key, &nonce, record.encrypted_title());
    let content = open_field(key, &nonce, record.encrypted_content());

    match (title, content) {
        (Ok(title), Ok(content)) => Ok(OpenedNote { title, content }),
        (title, content) => {
            warn!(
                title_ok = title.is_ok(),
                content_ok = content.is_ok(),
                "Note failed verification"
            );
            Err(title.err().or(content.err()).unwrap_or(Error::AuthenticationFailure))
        }
    }
}

/// Result of opening one record for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteBody {
    /// Both fields verified.
    Verified(OpenedNote),
    /// The record could not be verified and is left untouched in storage.
    Unreadable,
}

/// A stored note with its body opened, or marked unreadable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedNote {
    pub id: NoteId,
    pub folder_id: Option<FolderId>,
    pub tag_ids: Vec<TagId>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: NoteBody,
}

impl DecryptedNote {
    /// Open `record`, degrading to [`NoteBody::Unreadable`] on any failure.
    ///
    /// Never fails: one bad record must not take down the list it is in.
    pub fn open(record: &EncryptedNote, key: &DerivedKey) -> Self {
        let body = match open_note(record, key) {
            Ok(opened) => NoteBody::Verified(opened),
            Err(e) => {
                warn!(note_id = %record.id, error = %e, "Showing note as unreadable");
                NoteBody::Unreadable
            }
        };

        Self {
            id: record.id.clone(),
            folder_id: record.folder_id.clone(),
            tag_ids: record.tag_ids.clone(),
            is_archived: record.is_archived,
            created_at: record.created_at,
            updated_at: record.updated_at,
            body,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.body, NoteBody::Verified(_))
    }

    /// Title, or `placeholder` if unreadable.
    pub fn title<'a>(&'a self, placeholder: &'a str) -> &'a str {
        match &self.body {
            NoteBody::Verified(opened) => &opened.title,
            NoteBody::Unreadable => placeholder,
        }
    }

    /// Content, or `placeholder` if unreadable.
    pub fn content<'a>(&'a self, placeholder: &'a str) -> &'a str {
        match &self.body {
            NoteBody::Verified(opened) => &opened.content,
            NoteBody::Unreadable => placeholder,
        }
    }
}
