//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level storage backend holding a single durable unit.
///
/// Storage backends are **opaque byte stores**. The record store owns all
/// format interpretation - backends do not understand collections, counters,
/// or documents.
///
/// # Invariants
///
/// - `read_all` returns `None` until the first successful `write_all`
/// - `read_all` returns exactly the bytes of the last successful `write_all`
/// - `write_all` either fully replaces the previous contents or leaves them untouched
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads the whole durable unit.
    ///
    /// Returns `None` if nothing has ever been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit exists but cannot be read.
    fn read_all(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Atomically replaces the durable unit with `data`.
    ///
    /// After this returns successfully the new contents survive process
    /// termination (subject to the backend's durability settings).
    ///
    /// # Errors
    ///
    /// Returns an error if the replacement fails. The previous contents
    /// remain intact in that case.
    fn write_all(&mut self, data: &[u8]) -> StorageResult<()>;

    /// Returns whether the durable unit has been written at least once.
    fn exists(&self) -> bool;

    /// Returns the current size of the durable unit in bytes (0 if absent).
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Short human-readable description of where the data lives.
    fn describe(&self) -> String;
}
