//! Storage and authentication collaborators for SealNote.
//!
//! This module provides trait-based interfaces for the encrypted-blob note
//! store and the account service, plus in-memory implementations used by
//! tests and the CLI.
//!
//! # Design Principles
//! - Zero knowledge: this crate has no access to any cipher and only ever
//!   handles ciphertext, nonces and non-secret metadata
//! - Async operations: all collaborator calls are async
//! - Unified error semantics: consistent error types across implementations

pub mod auth;
pub mod memory;
pub mod provider;

pub use auth::{AuthGrant, AuthProvider, MemoryAuth};
pub use memory::MemoryNoteStore;
pub use provider::NoteStore;
