//! Note store trait definition.

use async_trait::async_trait;

use sealnote_common::{
    EncryptedNote, Folder, FolderId, NewNote, NoteId, NotePatch, NoteQuery, Result, Tag, TagId,
    UserId,
};

/// Encrypted-blob storage for notes, folders and tags.
///
/// Every call is scoped to the authenticated `owner`; records belonging to
/// another user behave as if they do not exist. Implementations store the
/// encrypted fields verbatim and never attempt to interpret them.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Get the store name (e.g., "memory", "http").
    fn name(&self) -> &str;

    /// Create a note (`POST /notes`).
    ///
    /// # Preconditions
    /// - All three encrypted fields are present
    /// - Referenced folder and tags exist for `owner`
    ///
    /// # Errors
    /// - `InvalidInput` if an encrypted field is missing
    /// - `NotFound` if a referenced folder or tag is unknown
    async fn create_note(&self, owner: &UserId, note: NewNote) -> Result<EncryptedNote>;

    /// Apply a partial update (`PUT /notes/{id}`).
    ///
    /// # Errors
    /// - `NotFound` if the note does not exist for `owner`
    /// - `InvalidInput` if the encrypted fields are not replaced together
    /// - `Conflict` if the new `iv` equals the stored one
    async fn update_note(&self, owner: &UserId, id: &NoteId, patch: NotePatch)
        -> Result<EncryptedNote>;

    /// Fetch a single note.
    async fn get_note(&self, owner: &UserId, id: &NoteId) -> Result<EncryptedNote>;

    /// List notes matching `query`, most recently updated first.
    async fn list_notes(&self, owner: &UserId, query: &NoteQuery) -> Result<Vec<EncryptedNote>>;

    /// Hard-delete a note. No tombstone is kept.
    async fn delete_note(&self, owner: &UserId, id: &NoteId) -> Result<()>;

    /// Create a folder. `color` defaults to [`sealnote_common::wire::DEFAULT_COLOR`].
    async fn create_folder(&self, owner: &UserId, name: &str, color: Option<&str>)
        -> Result<Folder>;

    /// List folders in name order.
    async fn list_folders(&self, owner: &UserId) -> Result<Vec<Folder>>;

    /// Delete a folder, detaching every note that referenced it.
    async fn delete_folder(&self, owner: &UserId, id: &FolderId) -> Result<()>;

    /// Create a tag. `color` defaults to [`sealnote_common::wire::DEFAULT_COLOR`].
    async fn create_tag(&self, owner: &UserId, name: &str, color: Option<&str>) -> Result<Tag>;

    /// List tags in name order.
    async fn list_tags(&self, owner: &UserId) -> Result<Vec<Tag>>;

    /// Delete a tag, removing it from every note that carried it.
    async fn delete_tag(&self, owner: &UserId, id: &TagId) -> Result<()>;
}
