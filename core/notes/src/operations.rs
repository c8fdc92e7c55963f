//! Note operations with encryption/decryption.

use std::sync::Arc;
use tracing::{debug, info};

use crate::batch::open_batch;
use crate::config::NotesConfig;
use crate::record::{seal_note, DecryptedNote};
use crate::session::KeySession;
use sealnote_common::{FolderId, NoteId, NotePatch, NoteQuery, Result, TagId, UserId};
use sealnote_crypto::DerivedKey;
use sealnote_storage::NoteStore;

/// Note operations handler.
///
/// Every note crossing the storage boundary passes through the record codec.
/// The key is looked up from the session on each call, so an operation after
/// logout fails with `KeyAbsent` instead of attempting any cryptography.
pub struct NoteOperations<'a> {
    session: &'a KeySession,
    store: Arc<dyn NoteStore>,
    owner: UserId,
    config: NotesConfig,
}

impl<'a> NoteOperations<'a> {
    /// Create a new operations handler for `owner`.
    pub fn new(session: &'a KeySession, store: Arc<dyn NoteStore>, owner: UserId) -> Self {
        Self::with_config(session, store, owner, NotesConfig::default())
    }

    pub fn with_config(
        session: &'a KeySession,
        store: Arc<dyn NoteStore>,
        owner: UserId,
        config: NotesConfig,
    ) -> Self {
        Self {
            session,
            store,
            owner,
            config,
        }
    }

    pub fn config(&self) -> &NotesConfig {
        &self.config
    }

    fn key(&self) -> Result<Arc<DerivedKey>> {
        self.session.require()
    }

    /// Create a new encrypted note.
    ///
    /// # Preconditions
    /// - Session holds a key
    ///
    /// # Postconditions
    /// - Storage holds ciphertext only, title and content under one new nonce
    ///
    /// # Errors
    /// - `KeyAbsent` if the session has no key
    /// - Storage failure
    pub async fn create_note(
        &self,
        title: &str,
        content: &str,
        folder_id: Option<FolderId>,
        tag_ids: Vec<TagId>,
    ) -> Result<DecryptedNote> {
        let key = self.key()?;
        let request = seal_note(title, content, &key)?.into_new_note(folder_id, tag_ids);

        let stored = self.store.create_note(&self.owner, request).await?;

        info!(note_id = %stored.id, "Note created");
        Ok(DecryptedNote::open(&stored, &key))
    }

    /// Replace a note's title and content, and optionally its folder and tags,
    /// in a single write.
    ///
    /// Both fields are resealed under a brand-new nonce even when only one of
    /// them changed. `folder: Some(None)` detaches the note; `None` leaves the
    /// folder or tags as stored.
    ///
    /// # Errors
    /// - `KeyAbsent` if the session has no key
    /// - `NotFound` if the note, folder or a tag does not exist
    pub async fn update_note(
        &self,
        id: &NoteId,
        title: &str,
        content: &str,
        folder: Option<Option<FolderId>>,
        tags: Option<Vec<TagId>>,
    ) -> Result<DecryptedNote> {
        let key = self.key()?;
        let mut patch = seal_note(title, content, &key)?.into_patch();
        if let Some(folder) = folder {
            patch = patch.with_folder(folder);
        }
        if let Some(tags) = tags {
            patch = patch.with_tags(tags);
        }

        let stored = self.store.update_note(&self.owner, id, patch).await?;

        info!(note_id = %id, "Note updated");
        Ok(DecryptedNote::open(&stored, &key))
    }

    /// Read and decrypt a single note.
    ///
    /// A note that fails verification comes back as unreadable, not as an
    /// error.
    pub async fn get_note(&self, id: &NoteId) -> Result<DecryptedNote> {
        let key = self.key()?;
        let stored = self.store.get_note(&self.owner, id).await?;
        Ok(DecryptedNote::open(&stored, &key))
    }

    /// List and decrypt notes matching `query`.
    ///
    /// # Postconditions
    /// - One result per stored note, in storage order
    /// - Unreadable notes are flagged individually
    pub async fn list_notes(&self, query: &NoteQuery) -> Result<Vec<DecryptedNote>> {
        let key = self.key()?;
        let records = self.store.list_notes(&self.owner, query).await?;

        debug!(
            store = self.store.name(),
            count = records.len(),
            "Fetched encrypted notes"
        );
        open_batch(records, key, self.config.batch_concurrency).await
    }

    /// Set or clear the archive flag. Touches no ciphertext.
    pub async fn set_archived(&self, id: &NoteId, archived: bool) -> Result<()> {
        self.store
            .update_note(&self.owner, id, NotePatch::archive(archived))
            .await?;
        debug!(note_id = %id, archived, "Archive flag changed");
        Ok(())
    }

    /// Move a note into a folder, or out of any folder with `None`.
    pub async fn move_to_folder(&self, id: &NoteId, folder: Option<FolderId>) -> Result<()> {
        self.store
            .update_note(&self.owner, id, NotePatch::default().with_folder(folder))
            .await?;
        Ok(())
    }

    /// Replace a note's tags.
    pub async fn set_tags(&self, id: &NoteId, tags: Vec<TagId>) -> Result<()> {
        self.store
            .update_note(&self.owner, id, NotePatch::default().with_tags(tags))
            .await?;
        Ok(())
    }

    /// Permanently delete a note.
    pub async fn delete_note(&self, id: &NoteId) -> Result<()> {
        self.store.delete_note(&self.owner, id).await?;
        info!(note_id = %id, "Note deleted");
        Ok(())
    }
}
