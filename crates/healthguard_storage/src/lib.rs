//! # HealthGuard Storage
//!
//! Storage backend trait and implementations for the HealthGuard record store.
//!
//! This crate provides the lowest-level storage abstraction. Storage backends
//! are **opaque byte stores** holding exactly one durable unit each - they do
//! not interpret the data they store.
//!
//! ## Design Principles
//!
//! - A backend holds one blob that is replaced as a whole
//! - Replacement is atomic: readers see the old blob or the new one, never a mix
//! - No knowledge of collections, documents, or the JSON layout
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use healthguard_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! assert!(backend.read_all().unwrap().is_none());
//!
//! backend.write_all(b"{\"auto_id\":0,\"records\":[]}").unwrap();
//! assert!(backend.exists());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
