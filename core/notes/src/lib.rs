//! Client-side note engine for Sealnote.
//!
//! This module provides:
//! - Key session lifecycle with an in-memory key and a non-secret marker
//! - Account flows that derive the key at registration and login
//! - The encrypted record codec for note title and content
//! - Note operations over any [`sealnote_storage::NoteStore`]
//!
//! # Architecture
//! Storage and auth only ever see ciphertext, nonces and salts. All
//! encryption and decryption happens in this crate, with the key taken from
//! an explicitly passed [`KeySession`].

pub mod batch;
pub mod config;
pub mod manager;
pub mod marker;
pub mod operations;
pub mod record;
pub mod session;

pub use batch::open_batch;
pub use config::NotesConfig;
pub use manager::AccountManager;
pub use marker::{MarkerStore, MemoryMarker};
pub use operations::NoteOperations;
pub use record::{open_note, seal_note, DecryptedNote, NoteBody, OpenedNote, SealedNote};
pub use session::{KeySession, KeyState};
