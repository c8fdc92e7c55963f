//! Parallel decryption of fetched note lists.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::debug;

use crate::record::DecryptedNote;
use sealnote_common::{EncryptedNote, Error, Result};
use sealnote_crypto::DerivedKey;

/// Open every record in `records`, at most `concurrency` at a time.
///
/// Each record is opened on the blocking pool. Results come back in input
/// order, one per record; a record that fails verification is returned as
/// unreadable rather than aborting the batch.
///
/// # Errors
/// - `Crypto` if a worker task panicked or was cancelled
pub async fn open_batch(
    records: Vec<EncryptedNote>,
    key: Arc<DerivedKey>,
    concurrency: usize,
) -> Result<Vec<DecryptedNote>> {
    let total = records.len();

    let opened: Vec<_> = stream::iter(records)
        .map(|record| {
            let key = Arc::clone(&key);
            tokio::task::spawn_blocking(move || DecryptedNote::open(&record, &key))
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let notes = opened
        .into_iter()
        .map(|joined| {
            joined.map_err(|e| Error::Crypto(format!("Decryption task failed: {}", e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let unreadable = notes.iter().filter(|n| !n.is_verified()).count();
    debug!(total, unreadable, "Opened note batch");
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::seal_note;
    use chrono::{Duration, Utc};
    use sealnote_common::{Base64Bytes, NoteId};
    use sealnote_crypto::{derive_key, Salt};

    fn key() -> Arc<DerivedKey> {
        Arc::new(derive_key("batch-pw", &Salt::from_bytes([3u8; 16])).unwrap())
    }

    fn records(key: &DerivedKey, n: usize) -> Vec<EncryptedNote> {
        let base = Utc::now();
        (0..n)
            .map(|i| {
                let sealed = seal_note(&format!("title {}", i), &format!("body {}", i), key)
                    .unwrap()
                    .into_new_note(None, Vec::new());
                EncryptedNote {
                    id: NoteId::new(format!("note-{}", i)).unwrap(),
                    encrypted_title: sealed.encrypted_title,
                    encrypted_content: sealed.encrypted_content,
                    iv: sealed.iv,
                    folder_id: None,
                    tag_ids: Vec::new(),
                    is_archived: false,
                    created_at: base,
                    updated_at: base - Duration::seconds(i as i64),
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let key = key();
        let input = records(&key, 20);
        let ids: Vec<NoteId> = input.iter().map(|r| r.id.clone()).collect();

        let notes = open_batch(input, key, 4).await.unwrap();

        assert_eq!(notes.len(), 20);
        assert_eq!(notes.iter().map(|n| n.id.clone()).collect::<Vec<_>>(), ids);
        for (i, note) in notes.iter().enumerate() {
            assert_eq!(note.title(""), format!("title {}", i));
            assert_eq!(note.content(""), format!("body {}", i));
        }
    }

    #[tokio::test]
    async fn test_one_corrupted_record_is_isolated() {
        let key = key();
        let mut input = records(&key, 5);
        let mut title = input[2].encrypted_title.clone().into_inner();
        title[0] ^= 0x01;
        input[2].encrypted_title = Base64Bytes::new(title);

        let notes = open_batch(input, key, 2).await.unwrap();

        assert_eq!(notes.len(), 5);
        assert_eq!(notes.iter().filter(|n| n.is_verified()).count(), 4);
        assert!(!notes[2].is_verified());
        assert_eq!(notes[2].id.as_str(), "note-2");
        assert_eq!(notes[3].title(""), "title 3");
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let notes = open_batch(Vec::new(), key(), 8).await.unwrap();
        assert!(notes.is_empty());
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_progresses() {
        let key = key();
        let notes = open_batch(records(&key, 3), key, 0).await.unwrap();
        assert_eq!(notes.len(), 3);
    }
}
