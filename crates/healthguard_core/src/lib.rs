//! # HealthGuard Core
//!
//! Embedded per-collection JSON record store for the HealthGuard backend.
//!
//! This crate provides:
//! - [`Collection`]: a named set of schema-less documents with auto-assigned
//!   integer ids, CRUD, bulk operations and linear-scan queries
//! - Snapshot-before-write backups with bounded retention ([`BackupManager`])
//! - A process-wide [`Registry`] mapping each name to one collection
//! - Salted password hashing ([`hash_password`], [`verify_password`])
//!
//! ## Concurrency
//!
//! Every operation on a collection runs under that collection's lock, so
//! read-modify-write cycles never interleave. Collections are independent:
//! there are no cross-collection transactions.
//!
//! ## Example
//!
//! ```rust
//! use healthguard_core::{EntityKind, Filter, Registry};
//! use serde_json::json;
//!
//! let registry = Registry::open_in_memory();
//! let appointments = registry.entity(EntityKind::Appointments).unwrap();
//!
//! let doc = healthguard_core::into_document(json!({"doctor": 7, "status": "booked"})).unwrap();
//! let stored = appointments.create(doc).unwrap();
//!
//! let found = appointments.first(&Filter::new().eq("doctor", 7)).unwrap();
//! assert_eq!(found, stored);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backup;
pub mod bootstrap;
mod collection;
mod config;
mod credentials;
mod dir;
mod document;
mod entity;
mod error;
mod registry;
mod stats;

pub use backup::{BackupEntry, BackupManager};
pub use collection::{Collection, CollectionSummary, Filter};
pub use config::{Config, BACKUP_DIR_NAME, MAX_BACKUPS};
pub use credentials::{hash_password, verify_password};
pub use dir::DataDir;
pub use document::{
    document_id, into_document, now_timestamp, Document, DocumentId, CREATED_AT_FIELD, ID_FIELD,
    UPDATED_AT_FIELD,
};
pub use entity::EntityKind;
pub use error::{CoreError, CoreResult};
pub use registry::Registry;
pub use stats::CollectionStats;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
