//! In-memory note store for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::provider::NoteStore;
use sealnote_common::wire::DEFAULT_COLOR;
use sealnote_common::{
    EncryptedNote, Error, Folder, FolderId, NewNote, NoteId, NotePatch, NoteQuery, Result, Tag,
    TagId, UserId,
};

/// Everything stored for one account.
#[derive(Debug, Default)]
struct Account {
    notes: HashMap<NoteId, EncryptedNote>,
    folders: HashMap<FolderId, Folder>,
    tags: HashMap<TagId, Tag>,
}

impl Account {
    fn check_references(&self, folder: Option<&FolderId>, tags: &[TagId]) -> Result<()> {
        if let Some(folder) = folder {
            if !self.folders.contains_key(folder) {
                return Err(Error::NotFound(format!("Folder not found: {}", folder)));
            }
        }
        if let Some(tag) = tags.iter().find(|t| !self.tags.contains_key(*t)) {
            return Err(Error::NotFound(format!("Tag not found: {}", tag)));
        }
        Ok(())
    }

    fn note_mut(&mut self, id: &NoteId) -> Result<&mut EncryptedNote> {
        self.notes
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("Note not found: {}", id)))
    }
}

/// In-memory note store.
///
/// Useful for testing and development. All data is stored in memory
/// and lost on drop.
#[derive(Default)]
pub struct MemoryNoteStore {
    accounts: RwLock<HashMap<UserId, Account>>,
}

impl MemoryNoteStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notes stored for `owner`.
    pub async fn note_count(&self, owner: &UserId) -> usize {
        self.accounts
            .read()
            .await
            .get(owner)
            .map(|a| a.notes.len())
            .unwrap_or(0)
    }
}

fn not_found(kind: &str, id: &impl std::fmt::Display) -> Error {
    Error::NotFound(format!("{} not found: {}", kind, id))
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_note(&self, owner: &UserId, note: NewNote) -> Result<EncryptedNote> {
        note.validate()?;

        let mut accounts = self.accounts.write().await;
        let account = accounts.entry(owner.clone()).or_default();
        account.check_references(note.folder_id.as_ref(), &note.tag_ids)?;

        let now = Utc::now();
        let stored = EncryptedNote {
            id: NoteId::generate(),
            encrypted_title: note.encrypted_title,
            encrypted_content: note.encrypted_content,
            iv: note.iv,
            folder_id: note.folder_id,
            tag_ids: note.tag_ids,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        account.notes.insert(stored.id.clone(), stored.clone());

        debug!(note_id = %stored.id, owner = %owner, "Stored encrypted note");
        Ok(stored)
    }

    async fn update_note(
        &self,
        owner: &UserId,
        id: &NoteId,
        patch: NotePatch,
    ) -> Result<EncryptedNote> {
        patch.validate()?;

        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(owner).ok_or_else(|| not_found("Note", id))?;

        if let Some(Some(folder)) = &patch.folder_id {
            account.check_references(Some(folder), &[])?;
        }
        if let Some(tags) = &patch.tag_ids {
            account.check_references(None, tags)?;
        }

        let note = account.note_mut(id)?;
        if let Some(iv) = &patch.iv {
            if *iv == note.iv {
                return Err(Error::Conflict(format!("Nonce reused for note {}", id)));
            }
        }

        let NotePatch {
            encrypted_title,
            encrypted_content,
            iv,
            folder_id,
            tag_ids,
            is_archived,
        } = patch;

        if let Some(title) = encrypted_title {
            note.encrypted_title = title;
        }
        if let Some(content) = encrypted_content {
            note.encrypted_content = content;
        }
        if let Some(iv) = iv {
            note.iv = iv;
        }
        if let Some(folder) = folder_id {
            note.folder_id = folder;
        }
        if let Some(tags) = tag_ids {
            note.tag_ids = tags;
        }
        if let Some(archived) = is_archived {
            note.is_archived = archived;
        }
        note.updated_at = Utc::now();

        debug!(note_id = %id, "Updated encrypted note");
        Ok(note.clone())
    }

    async fn get_note(&self, owner: &UserId, id: &NoteId) -> Result<EncryptedNote> {
        self.accounts
            .read()
            .await
            .get(owner)
            .and_then(|a| a.notes.get(id))
            .cloned()
            .ok_or_else(|| not_found("Note", id))
    }

    async fn list_notes(&self, owner: &UserId, query: &NoteQuery) -> Result<Vec<EncryptedNote>> {
        let accounts = self.accounts.read().await;
        let mut notes: Vec<EncryptedNote> = accounts
            .get(owner)
            .map(|a| a.notes.values().filter(|n| query.matches(n)).cloned().collect())
            .unwrap_or_default();

        notes.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(notes)
    }

    async fn delete_note(&self, owner: &UserId, id: &NoteId) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        accounts
            .get_mut(owner)
            .and_then(|a| a.notes.remove(id))
            .map(|_| ())
            .ok_or_else(|| not_found("Note", id))
    }

    async fn create_folder(
        &self,
        owner: &UserId,
        name: &str,
        color: Option<&str>,
    ) -> Result<Folder> {
        if name.is_empty() {
            return Err(Error::InvalidInput("Folder name is required".to_string()));
        }
        let folder = Folder {
            id: FolderId::generate(),
            name: name.to_string(),
            color: color.unwrap_or(DEFAULT_COLOR).to_string(),
            created_at: Utc::now(),
        };

        let mut accounts = self.accounts.write().await;
        accounts
            .entry(owner.clone())
            .or_default()
            .folders
            .insert(folder.id.clone(), folder.clone());
        Ok(folder)
    }

    async fn list_folders(&self, owner: &UserId) -> Result<Vec<Folder>> {
        let accounts = self.accounts.read().await;
        let mut folders: Vec<Folder> = accounts
            .get(owner)
            .map(|a| a.folders.values().cloned().collect())
            .unwrap_or_default();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn delete_folder(&self, owner: &UserId, id: &FolderId) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(owner).ok_or_else(|| not_found("Folder", id))?;
        if account.folders.remove(id).is_none() {
            return Err(not_found("Folder", id));
        }

        let mut detached = 0usize;
        for note in account.notes.values_mut() {
            if note.folder_id.as_ref() == Some(id) {
                note.folder_id = None;
                detached += 1;
            }
        }
        debug!(folder_id = %id, detached, "Deleted folder");
        Ok(())
    }

    async fn create_tag(&self, owner: &UserId, name: &str, color: Option<&str>) -> Result<Tag> {
        if name.is_empty() {
            return Err(Error::InvalidInput("Tag name is required".to_string()));
        }
        let tag = Tag {
            id: TagId::generate(),
            name: name.to_string(),
            color: color.unwrap_or(DEFAULT_COLOR).to_string(),
            created_at: Utc::now(),
        };

        let mut accounts = self.accounts.write().await;
        accounts
            .entry(owner.clone())
            .or_default()
            .tags
            .insert(tag.id.clone(), tag.clone());
        Ok(tag)
    }

    async fn list_tags(&self, owner: &UserId) -> Result<Vec<Tag>> {
        let accounts = self.accounts.read().await;
        let mut tags: Vec<Tag> = accounts
            .get(owner)
            .map(|a| a.tags.values().cloned().collect())
            .unwrap_or_default();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn delete_tag(&self, owner: &UserId, id: &TagId) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(owner).ok_or_else(|| not_found("Tag", id))?;
        if account.tags.remove(id).is_none() {
            return Err(not_found("Tag", id));
        }
        for note in account.notes.values_mut() {
            note.tag_ids.retain(|t| t != id);
        }
        debug!(tag_id = %id, "Deleted tag");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealnote_common::Base64Bytes;
    use std::time::Duration;

    fn owner() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn new_note(iv_byte: u8) -> NewNote {
        NewNote {
            encrypted_title: Base64Bytes::new(vec![1; 20]),
            encrypted_content: Base64Bytes::new(vec![2; 20]),
            iv: Base64Bytes::new(vec![iv_byte; 12]),
            folder_id: None,
            tag_ids: Vec::new(),
        }
    }

    fn reseal(iv_byte: u8) -> NotePatch {
        NotePatch {
            encrypted_title: Some(Base64Bytes::new(vec![3; 20])),
            encrypted_content: Some(Base64Bytes::new(vec![4; 20])),
            iv: Some(Base64Bytes::new(vec![iv_byte; 12])),
            ..NotePatch::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get_note() {
        let store = MemoryNoteStore::new();
        let created = store.create_note(&owner(), new_note(1)).await.unwrap();

        let fetched = store.get_note(&owner(), &created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert!(!fetched.is_archived);
        assert_eq!(store.note_count(&owner()).await, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_iv() {
        let store = MemoryNoteStore::new();
        let mut note = new_note(1);
        note.iv = Base64Bytes::default();

        let result = store.create_note(&owner(), note).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_notes_are_scoped_to_owner() {
        let store = MemoryNoteStore::new();
        let created = store.create_note(&owner(), new_note(1)).await.unwrap();
        let other = UserId::new("user-2").unwrap();

        assert!(matches!(
            store.get_note(&other, &created.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(store
            .list_notes(&other, &NoteQuery::active())
            .await
            .unwrap()
            .is_empty());
        assert!(store.delete_note(&other, &created.id).await.is_err());
    }

    #[tokio::test]
    async fn test_update_replaces_encrypted_payload() {
        let store = MemoryNoteStore::new();
        let created = store.create_note(&owner(), new_note(1)).await.unwrap();

        let updated = store
            .update_note(&owner(), &created.id, reseal(2))
            .await
            .unwrap();
        assert_eq!(updated.iv.as_bytes(), &[2u8; 12]);
        assert_eq!(updated.encrypted_title.as_bytes(), &[3u8; 20]);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_rejects_nonce_reuse() {
        let store = MemoryNoteStore::new();
        let created = store.create_note(&owner(), new_note(1)).await.unwrap();

        let result = store.update_note(&owner(), &created.id, reseal(1)).await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_partial_payload() {
        let store = MemoryNoteStore::new();
        let created = store.create_note(&owner(), new_note(1)).await.unwrap();

        let patch = NotePatch {
            encrypted_title: Some(Base64Bytes::new(vec![9; 20])),
            ..NotePatch::default()
        };
        let result = store.update_note(&owner(), &created.id, patch).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_archive_filters_listing() {
        let store = MemoryNoteStore::new();
        let a = store.create_note(&owner(), new_note(1)).await.unwrap();
        let _b = store.create_note(&owner(), new_note(2)).await.unwrap();

        store
            .update_note(&owner(), &a.id, NotePatch::archive(true))
            .await
            .unwrap();

        let active = store.list_notes(&owner(), &NoteQuery::active()).await.unwrap();
        let archived = store.list_notes(&owner(), &NoteQuery::archived()).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id, a.id);
    }

    #[tokio::test]
    async fn test_delete_is_hard() {
        let store = MemoryNoteStore::new();
        let created = store.create_note(&owner(), new_note(1)).await.unwrap();

        store.delete_note(&owner(), &created.id).await.unwrap();
        assert!(matches!(
            store.get_note(&owner(), &created.id).await,
            Err(Error::NotFound(_))
        ));
        assert_eq!(store.note_count(&owner()).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_folder_reference_rejected() {
        let store = MemoryNoteStore::new();
        let mut note = new_note(1);
        note.folder_id = Some(FolderId::new("missing").unwrap());

        assert!(matches!(
            store.create_note(&owner(), note).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_folder_detaches_notes() {
        let store = MemoryNoteStore::new();
        let folder = store.create_folder(&owner(), "Work", None).await.unwrap();
        assert_eq!(folder.color, DEFAULT_COLOR);

        let mut note = new_note(1);
        note.folder_id = Some(folder.id.clone());
        let created = store.create_note(&owner(), note).await.unwrap();

        store.delete_folder(&owner(), &folder.id).await.unwrap();

        let fetched = store.get_note(&owner(), &created.id).await.unwrap();
        assert_eq!(fetched.folder_id, None);
        assert!(store.list_folders(&owner()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_tag_detaches_notes() {
        let store = MemoryNoteStore::new();
        let keep = store.create_tag(&owner(), "keep", Some("#ff0000")).await.unwrap();
        let drop_me = store.create_tag(&owner(), "drop", None).await.unwrap();

        let mut note = new_note(1);
        note.tag_ids = vec![keep.id.clone(), drop_me.id.clone()];
        let created = store.create_note(&owner(), note).await.unwrap();

        store.delete_tag(&owner(), &drop_me.id).await.unwrap();

        let fetched = store.get_note(&owner(), &created.id).await.unwrap();
        assert_eq!(fetched.tag_ids, vec![keep.id]);
    }

    #[tokio::test]
    async fn test_notes_listed_most_recent_first() {
        let store = MemoryNoteStore::new();
        let a = store.create_note(&owner(), new_note(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let b = store.create_note(&owner(), new_note(2)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let listed = store.list_notes(&owner(), &NoteQuery::active()).await.unwrap();
        assert_eq!(listed[0].id, b.id);
        assert_eq!(listed[1].id, a.id);

        // Touching A moves it back to the top.
        store
            .update_note(&owner(), &a.id, reseal(3))
            .await
            .unwrap();

        let listed = store.list_notes(&owner(), &NoteQuery::active()).await.unwrap();
        let ids: Vec<NoteId> = listed.into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_tags_listed_by_name() {
        let store = MemoryNoteStore::new();
        store.create_tag(&owner(), "work", None).await.unwrap();
        store.create_tag(&owner(), "home", None).await.unwrap();
        store.create_tag(&owner(), "ideas", None).await.unwrap();

        let names: Vec<String> = store
            .list_tags(&owner())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["home", "ideas", "work"]);
        assert!(store
            .list_tags(&UserId::new("user-2").unwrap())
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_store_name() {
        assert_eq!(MemoryNoteStore::new().name(), "memory");
    }

    #[tokio::test]
    async fn test_folders_listed_by_name() {
        let store = MemoryNoteStore::new();
        store.create_folder(&owner(), "Zeta", None).await.unwrap();
        store.create_folder(&owner(), "Alpha", None).await.unwrap();

        let names: Vec<String> = store
            .list_folders(&owner())
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }
}
