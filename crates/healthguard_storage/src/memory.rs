//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::sync::Arc;

/// An in-memory storage backend.
///
/// This backend stores its unit in memory and is suitable for:
/// - Unit tests
/// - Ephemeral collections that don't need persistence
///
/// Clones share the same underlying buffer, so a test can keep a handle
/// and inspect what a collection persisted.
///
/// # Example
///
/// ```rust
/// use healthguard_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// let observer = backend.clone();
///
/// backend.write_all(b"test data").unwrap();
/// assert_eq!(observer.data(), Some(b"test data".to_vec()));
/// assert_eq!(backend.size().unwrap(), 9);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    data: Arc<RwLock<Option<Vec<u8>>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing data.
    ///
    /// Useful for testing load and recovery behavior.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(Some(data))),
        }
    }

    /// Returns a copy of the stored unit, if any.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_all(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data.read().clone())
    }

    fn write_all(&mut self, new_data: &[u8]) -> StorageResult<()> {
        *self.data.write() = Some(new_data.to_vec());
        Ok(())
    }

    fn exists(&self) -> bool {
        self.data.read().is_some()
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().as_ref().map_or(0, |d| d.len() as u64))
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let backend = InMemoryBackend::new();
        assert!(!backend.exists());
        assert_eq!(backend.size().unwrap(), 0);
        assert!(backend.read_all().unwrap().is_none());
    }

    #[test]
    fn memory_write_replaces() {
        let mut backend = InMemoryBackend::new();

        backend.write_all(b"hello").unwrap();
        backend.write_all(b"world!").unwrap();

        assert_eq!(backend.read_all().unwrap().unwrap(), b"world!");
        assert_eq!(backend.size().unwrap(), 6);
    }

    #[test]
    fn memory_empty_write_still_exists() {
        let mut backend = InMemoryBackend::new();
        backend.write_all(b"").unwrap();
        assert!(backend.exists());
        assert_eq!(backend.size().unwrap(), 0);
    }

    #[test]
    fn memory_with_data() {
        let backend = InMemoryBackend::with_data(b"preloaded".to_vec());
        assert!(backend.exists());
        assert_eq!(backend.read_all().unwrap().unwrap(), b"preloaded");
    }

    #[test]
    fn memory_clones_share_buffer() {
        let mut backend = InMemoryBackend::new();
        let observer = backend.clone();

        backend.write_all(b"shared").unwrap();
        assert_eq!(observer.data().unwrap(), b"shared");
    }
}
