//! Snapshot-before-write backups with bounded retention.
//!
//! Before every mutating write a collection hands its current durable bytes to
//! its [`BackupManager`], which stores them as a timestamped snapshot and then
//! prunes the oldest snapshots so that at most `max_backups` remain.
//!
//! ## Layout
//!
//! ```text
//! <backup_dir>/<collection>/
//! ├─ users_20261018_093015_120044.json
//! ├─ users_20261018_093016_001872.json
//! └─ users_20261018_093017_554310.json
//! ```
//!
//! Stamps are fixed-width UTC `YYYYMMDD_HHMMSS_micros`, so sorting file names
//! lexicographically sorts snapshots chronologically. A manager never issues
//! the same stamp twice: if the clock has not advanced past the previous
//! stamp, the new one is bumped by one microsecond.
//!
//! ## Older snapshots
//!
//! Directories written before stamps were UTC with microseconds may hold
//! files named `<collection>_YYYYMMDD_HHMMSS.json` in local time. Those do
//! not sort reliably against current stamps, so they are listed before every
//! current snapshot, never chosen as the latest while a current one exists,
//! and never pruned. Delete them by hand once they are no longer needed.
//!
//! Snapshots are best-effort. Callers log and count failures; they never
//! abort the write that triggered them.

use chrono::{Duration, NaiveDateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";
const SNAPSHOT_EXT: &str = ".json";

/// A snapshot file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    /// File name, e.g. `users_20261018_093015_120044.json`.
    pub file_name: String,
    /// Full path to the snapshot.
    pub path: PathBuf,
    /// Stamp portion of the file name.
    pub stamp: String,
    /// Size in bytes.
    pub size: u64,
}

impl BackupEntry {
    /// Parses the stamp into a UTC timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.stamp, STAMP_FORMAT).ok()
    }
}

/// Creates, lists and prunes snapshots for one collection.
#[derive(Debug)]
pub struct BackupManager {
    collection: String,
    dir: PathBuf,
    max_backups: usize,
    last_stamp: Option<NaiveDateTime>,
}

impl BackupManager {
    /// Creates a manager storing snapshots of `collection` under `dir`.
    ///
    /// No I/O happens until the first snapshot.
    #[must_use]
    pub fn new(collection: impl Into<String>, dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            collection: collection.into(),
            dir: dir.into(),
            max_backups,
            last_stamp: None,
        }
    }

    /// Returns the snapshot directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the retention limit.
    #[must_use]
    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// Stores `data` as a new snapshot and prunes old ones.
    ///
    /// Returns `None` when retention is zero and nothing was written.
    pub fn snapshot(&mut self, data: &[u8]) -> io::Result<Option<BackupEntry>> {
        if self.max_backups == 0 {
            return Ok(None);
        }

        fs::create_dir_all(&self.dir)?;

        let stamp = self.next_stamp()?;
        let stamp_text = stamp.format(STAMP_FORMAT).to_string();
        let file_name = format!("{}_{}{}", self.collection, stamp_text, SNAPSHOT_EXT);
        let path = self.dir.join(&file_name);

        fs::write(&path, data)?;
        self.last_stamp = Some(stamp);
        debug!(collection = %self.collection, file = %file_name, "backup snapshot written");

        let pruned = self.prune()?;
        if pruned > 0 {
            debug!(collection = %self.collection, pruned, "old backups pruned");
        }

        Ok(Some(BackupEntry {
            file_name,
            path,
            stamp: stamp_text,
            size: data.len() as u64,
        }))
    }

    /// Deletes the oldest snapshots until at most `max_backups` remain.
    ///
    /// Only snapshots with a current stamp are counted or removed.
    /// Returns the number of snapshots removed.
    pub fn prune(&self) -> io::Result<usize> {
        let mut entries = self.list()?;
        entries.retain(|entry| entry.created_at().is_some());
        let excess = entries.len().saturating_sub(self.max_backups);

        for entry in &entries[..excess] {
            match fs::remove_file(&entry.path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        Ok(excess)
    }

    /// Lists this collection's snapshots, oldest first.
    ///
    /// Snapshots whose stamp does not parse come before all others.
    pub fn list(&self) -> io::Result<Vec<BackupEntry>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let prefix = format!("{}_", self.collection);
        let mut entries = Vec::new();

        for item in read_dir {
            let item = item?;
            let Ok(file_name) = item.file_name().into_string() else {
                continue;
            };
            let Some(stamp) = file_name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(SNAPSHOT_EXT))
            else {
                continue;
            };
            let meta = item.metadata()?;
            if !meta.is_file() {
                continue;
            }

            entries.push(BackupEntry {
                stamp: stamp.to_string(),
                path: item.path(),
                size: meta.len(),
                file_name,
            });
        }

        entries.sort_by_cached_key(|entry| (entry.created_at().is_some(), entry.file_name.clone()));
        Ok(entries)
    }

    /// Returns the newest snapshot, if any.
    pub fn latest(&self) -> io::Result<Option<BackupEntry>> {
        Ok(self.list()?.pop())
    }

    /// Reads the contents of a snapshot.
    pub fn read(&self, entry: &BackupEntry) -> io::Result<Vec<u8>> {
        fs::read(&entry.path)
    }

    fn next_stamp(&mut self) -> io::Result<NaiveDateTime> {
        if self.last_stamp.is_none() {
            // Seed from disk so a restarted process keeps stamps increasing.
            self.last_stamp = self.latest()?.and_then(|entry| entry.created_at());
        }

        let now = Utc::now().naive_utc();
        Ok(match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        })
    }
}
