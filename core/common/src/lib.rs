//! Common utilities and types shared across SealNote modules.
//!
//! This module provides the error taxonomy, strongly typed identifiers and the
//! wire representation exchanged with the storage collaborator. Nothing here
//! knows how to encrypt or decrypt.

pub mod error;
pub mod types;
pub mod wire;

pub use error::{Error, Result};
pub use types::{FolderId, NoteId, TagId, UserId};
pub use wire::{Base64Bytes, EncryptedNote, EncryptedRecord, Folder, NewNote, NotePatch, NoteQuery, Tag};
