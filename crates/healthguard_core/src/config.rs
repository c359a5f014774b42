//! Record store configuration.

use std::path::PathBuf;

/// Number of snapshots retained per collection by default.
pub const MAX_BACKUPS: usize = 3;

/// Name of the backup namespace inside the data directory.
pub const BACKUP_DIR_NAME: &str = "_backups";

/// Configuration for opening a [`Registry`](crate::Registry).
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one `<name>.json` file per collection.
    pub data_dir: PathBuf,

    /// Directory holding snapshots. Defaults to `<data_dir>/_backups`.
    pub backup_dir: Option<PathBuf>,

    /// Maximum number of snapshots kept per collection.
    pub max_backups: usize,

    /// Whether to snapshot before each mutating write.
    pub backups_enabled: bool,

    /// Whether to indent persisted JSON.
    pub pretty: bool,

    /// Whether to fsync after every persisted write (safer but slower).
    pub sync_on_write: bool,

    /// Whether to create the data directory if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            backup_dir: None,
            max_backups: MAX_BACKUPS,
            backups_enabled: true,
            pretty: true,
            sync_on_write: true,
            create_if_missing: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration rooted at `data_dir`.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Sets the snapshot directory.
    #[must_use]
    pub fn backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }

    /// Sets how many snapshots are kept per collection.
    #[must_use]
    pub const fn max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    /// Sets whether snapshots are taken before writes.
    #[must_use]
    pub const fn backups_enabled(mut self, value: bool) -> Self {
        self.backups_enabled = value;
        self
    }

    /// Sets whether persisted JSON is indented.
    #[must_use]
    pub const fn pretty(mut self, value: bool) -> Self {
        self.pretty = value;
        self
    }

    /// Sets whether each write is fsynced.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets whether to create the data directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Resolved snapshot directory.
    #[must_use]
    pub fn resolved_backup_dir(&self) -> PathBuf {
        match &self.backup_dir {
            Some(dir) => dir.clone(),
            None => self.data_dir.join(BACKUP_DIR_NAME),
        }
    }

    /// Snapshot directory for a single collection.
    #[must_use]
    pub fn collection_backup_dir(&self, name: &str) -> PathBuf {
        self.resolved_backup_dir().join(name)
    }
}
