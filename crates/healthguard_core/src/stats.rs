//! Per-collection statistics.
//!
//! Counters are atomic and can be read without taking the collection lock,
//! so they may trail an in-flight operation by one step.
//!
//! # Usage
//!
//! ```rust
//! use healthguard_core::Collection;
//! use serde_json::Map;
//!
//! let users = Collection::in_memory("users").unwrap();
//! users.create(Map::new()).unwrap();
//!
//! let stats = users.stats();
//! assert_eq!(stats.creates(), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters for one collection.
#[derive(Debug, Default)]
pub struct CollectionStats {
    /// Read operations (get, scans, queries).
    reads: AtomicU64,
    /// Documents created.
    creates: AtomicU64,
    /// Documents updated.
    updates: AtomicU64,
    /// Documents deleted.
    deletes: AtomicU64,
    /// Successful primary writes.
    persists: AtomicU64,
    /// Failed primary writes.
    persist_failures: AtomicU64,
    /// Bytes written by successful primary writes.
    bytes_written: AtomicU64,
    /// Snapshots taken.
    backups: AtomicU64,
    /// Snapshots that failed and were skipped.
    backup_failures: AtomicU64,
}

impl CollectionStats {
    /// Creates a zeroed stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_creates(&self, count: u64) {
        self.creates.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deletes(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_persist(&self, bytes: u64) {
        self.persists.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_backup(&self) {
        self.backups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_backup_failure(&self) {
        self.backup_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of read operations.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of documents created.
    pub fn creates(&self) -> u64 {
        self.creates.load(Ordering::Relaxed)
    }

    /// Returns the number of documents updated.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Returns the number of documents deleted.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns the number of successful primary writes.
    pub fn persists(&self) -> u64 {
        self.persists.load(Ordering::Relaxed)
    }

    /// Returns the number of failed primary writes.
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures.load(Ordering::Relaxed)
    }

    /// Returns the total bytes written.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Returns the number of snapshots taken.
    pub fn backups(&self) -> u64 {
        self.backups.load(Ordering::Relaxed)
    }

    /// Returns the number of snapshots that failed.
    pub fn backup_failures(&self) -> u64 {
        self.backup_failures.load(Ordering::Relaxed)
    }
}
