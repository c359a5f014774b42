//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file-based storage backend.
///
/// The durable unit is one file. Every `write_all` goes through a sibling
/// temporary file that is renamed over the destination, so a crash mid-write
/// leaves either the previous file or the new one on disk.
///
/// # Durability
///
/// With `sync` enabled (the default), the temporary file is fsynced before the
/// rename and the parent directory is fsynced after it.
///
/// # Example
///
/// ```no_run
/// use healthguard_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("data/users.json")).unwrap();
/// backend.write_all(b"{\"auto_id\":0,\"records\":[]}").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    temp_path: PathBuf,
    sync: bool,
}

impl FileBackend {
    /// Opens a file backend at the given path.
    ///
    /// The file itself is not created until the first `write_all`; the
    /// parent directory is created if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut temp_name = path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("unit"));
        temp_name.push(".tmp");

        Ok(Self {
            path: path.to_path_buf(),
            temp_path: path.with_file_name(temp_name),
            sync: true,
        })
    }

    /// Sets whether writes are fsynced before returning.
    #[must_use]
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_temp(&self, data: &[u8]) -> io::Result<()> {
        let mut file = File::create(&self.temp_path)?;
        file.write_all(data)?;
        if self.sync {
            file.sync_all()?;
        }
        Ok(())
    }

    #[cfg(unix)]
    fn sync_parent(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => File::open(parent)?.sync_all(),
            _ => Ok(()),
        }
    }

    #[cfg(not(unix))]
    fn sync_parent(&self) -> io::Result<()> {
        // NTFS journals metadata updates; directory handles cannot be fsynced.
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn read_all(&self) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> StorageResult<()> {
        if let Err(e) = self.write_temp(data) {
            let _ = fs::remove_file(&self.temp_path);
            return Err(StorageError::persist(&self.path, e));
        }

        fs::rename(&self.temp_path, &self.path)
            .map_err(|e| StorageError::persist(&self.path, e))?;

        if self.sync {
            self.sync_parent()
                .map_err(|e| StorageError::persist(&self.path, e))?;
        }

        debug!(path = %self.path.display(), bytes = data.len(), "replaced file");
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn size(&self) -> StorageResult<u64> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
