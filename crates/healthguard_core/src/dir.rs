//! Data directory management.
//!
//! Layout of a HealthGuard data directory:
//!
//! ```text
//! <data_dir>/
//! ├─ LOCK                 # Advisory lock for single-process ownership
//! ├─ users.json           # One durable unit per collection
//! ├─ appointments.json
//! └─ _backups/
//!    └─ users/
//!       └─ users_<stamp>.json
//! ```
//!
//! Collections serialize access within one process. The LOCK file keeps a
//! second process from opening the same directory and racing on its files.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const COLLECTION_EXT: &str = "json";

/// An opened, exclusively locked data directory.
///
/// The lock is released when the value is dropped.
///
/// # Example
///
/// ```rust,no_run
/// use healthguard_core::DataDir;
/// use std::path::Path;
///
/// let dir = DataDir::open(Path::new("data"), true).unwrap();
/// println!("users live at {}", dir.collection_path("users").display());
/// ```
#[derive(Debug)]
pub struct DataDir {
    path: PathBuf,
    _lock_file: File,
}

impl DataDir {
    /// Opens or creates a data directory and takes its lock.
    ///
    /// # Errors
    ///
    /// - `DataDirMissing` if the directory is absent and `create_if_missing`
    ///   is false
    /// - `DataDirLocked` if another process holds the lock
    /// - I/O errors
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(CoreError::DataDirMissing {
                    path: path.display().to_string(),
                });
            }
        }

        if !path.is_dir() {
            return Err(CoreError::DataDirMissing {
                path: path.display().to_string(),
            });
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::DataDirLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the durable unit path for a collection.
    #[must_use]
    pub fn collection_path(&self, name: &str) -> PathBuf {
        self.path.join(format!("{name}.{COLLECTION_EXT}"))
    }

    /// Names of collections that have a durable unit in this directory,
    /// sorted.
    pub fn list_collection_files(&self) -> CoreResult<Vec<String>> {
        let mut names = Vec::new();

        for item in fs::read_dir(&self.path)? {
            let item = item?;
            let path = item.path();
            if !item.file_type()?.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(COLLECTION_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("data");

        let dir = DataDir::open(&path, true).unwrap();
        assert!(path.is_dir());
        assert!(path.join(LOCK_FILE).exists());
        assert_eq!(dir.path(), path);
    }

    #[test]
    fn open_fails_if_missing_and_no_create() {
        let temp = tempdir().unwrap();
        let result = DataDir::open(&temp.path().join("nope"), false);
        assert!(matches!(result, Err(CoreError::DataDirMissing { .. })));
    }

    #[test]
    fn lock_prevents_second_open() {
        let temp = tempdir().unwrap();
        let _first = DataDir::open(temp.path(), true).unwrap();

        let second = DataDir::open(temp.path(), true);
        assert!(matches!(second, Err(CoreError::DataDirLocked)));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = tempdir().unwrap();
        {
            let _dir = DataDir::open(temp.path(), true).unwrap();
        }
        let _again = DataDir::open(temp.path(), true).unwrap();
    }

    #[test]
    fn collection_files_are_listed() {
        let temp = tempdir().unwrap();
        let dir = DataDir::open(temp.path(), true).unwrap();

        fs::write(dir.collection_path("users"), b"{}").unwrap();
        fs::write(dir.collection_path("appointments"), b"{}").unwrap();
        fs::write(temp.path().join("users.json.tmp"), b"{}").unwrap();
        fs::write(temp.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(temp.path().join("_backups")).unwrap();

        assert_eq!(
            dir.list_collection_files().unwrap(),
            vec!["appointments".to_string(), "users".to_string()]
        );
    }
}
