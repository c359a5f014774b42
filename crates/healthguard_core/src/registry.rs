//! Process-wide collection registry.

use crate::backup::BackupManager;
use crate::collection::Collection;
use crate::config::Config;
use crate::dir::DataDir;
use crate::entity::EntityKind;
use crate::error::{CoreError, CoreResult};
use healthguard_storage::{FileBackend, InMemoryBackend, StorageBackend};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// The set of named collections backing one data directory.
///
/// Each name maps to exactly one [`Collection`] for the lifetime of the
/// registry. The first request for a name opens the collection (creating an
/// empty durable unit if needed); later requests return the same instance.
///
/// While a file-backed registry is alive it holds the data directory's LOCK,
/// so no second process can open the same files.
///
/// # Example
///
/// ```rust
/// use healthguard_core::{EntityKind, Registry};
///
/// let registry = Registry::open_in_memory();
/// let users = registry.entity(EntityKind::Users).unwrap();
/// let again = registry.collection("users").unwrap();
/// assert!(std::sync::Arc::ptr_eq(&users, &again));
/// ```
pub struct Registry {
    config: Config,
    /// `None` for in-memory registries.
    dir: Option<DataDir>,
    collections: Mutex<BTreeMap<String, Arc<Collection>>>,
}

impl Registry {
    /// Opens a registry over `config.data_dir`.
    ///
    /// Collections are opened lazily on first access.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be opened or is locked
    /// by another process.
    pub fn open(config: Config) -> CoreResult<Self> {
        let dir = DataDir::open(&config.data_dir, config.create_if_missing)?;
        info!(
            data_dir = %dir.path().display(),
            backups = config.backups_enabled,
            max_backups = config.max_backups,
            "registry opened"
        );

        Ok(Self {
            config,
            dir: Some(dir),
            collections: Mutex::new(BTreeMap::new()),
        })
    }

    /// Opens a registry and eagerly initializes every well-known collection.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::open`], plus any failure to initialize a
    /// collection's durable unit.
    pub fn open_all(config: Config) -> CoreResult<Self> {
        let registry = Self::open(config)?;
        for kind in EntityKind::ALL {
            registry.entity(kind)?;
        }
        Ok(registry)
    }

    /// Creates a registry whose collections live only in memory.
    ///
    /// Snapshots are disabled.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self {
            config: Config::default().backups_enabled(false),
            dir: None,
            collections: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the configuration the registry was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the data directory, if file-backed.
    #[must_use]
    pub fn data_dir(&self) -> Option<&DataDir> {
        self.dir.as_ref()
    }

    /// Returns the collection named `name`, opening it on first access.
    ///
    /// # Errors
    ///
    /// - `InvalidCollectionName` if the name cannot be used as a file stem
    /// - storage errors if a new collection's durable unit cannot be created
    pub fn collection(&self, name: &str) -> CoreResult<Arc<Collection>> {
        validate_name(name)?;

        // Held across the open so two threads never create the same collection.
        let mut collections = self.collections.lock();
        if let Some(existing) = collections.get(name) {
            return Ok(Arc::clone(existing));
        }

        let collection = Arc::new(self.open_collection(name)?);
        collections.insert(name.to_string(), Arc::clone(&collection));
        debug!(collection = name, "collection registered");
        Ok(collection)
    }

    /// Returns the collection for a well-known entity type.
    pub fn entity(&self, kind: EntityKind) -> CoreResult<Arc<Collection>> {
        self.collection(kind.as_str())
    }

    /// Names of collections opened so far, sorted.
    #[must_use]
    pub fn open_collections(&self) -> Vec<String> {
        self.collections.lock().keys().cloned().collect()
    }

    /// Names of collections with a durable unit on disk, sorted.
    ///
    /// In-memory registries report the collections opened so far.
    pub fn discover(&self) -> CoreResult<Vec<String>> {
        match &self.dir {
            Some(dir) => Ok(dir
                .list_collection_files()?
                .into_iter()
                .filter(|name| validate_name(name).is_ok())
                .collect()),
            None => Ok(self.open_collections()),
        }
    }

    fn open_collection(&self, name: &str) -> CoreResult<Collection> {
        let Some(dir) = &self.dir else {
            let backend: Box<dyn StorageBackend> = Box::new(InMemoryBackend::new());
            return Collection::open(name, backend, None, self.config.pretty);
        };

        let backend = FileBackend::open(&dir.collection_path(name))?
            .with_sync(self.config.sync_on_write);
        let backups = self.config.backups_enabled.then(|| {
            BackupManager::new(
                name,
                self.config.collection_backup_dir(name),
                self.config.max_backups,
            )
        });

        Collection::open(name, Box::new(backend), backups, self.config.pretty)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("data_dir", &self.dir.as_ref().map(DataDir::path))
            .field("collections", &self.open_collections())
            .finish()
    }
}

/// Collection names become file stems, so they are limited to ASCII
/// letters, digits, `_` and `-`, and may not start with `_` (reserved for
/// the backup namespace) or `-`.
fn validate_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::invalid_collection_name(name, "empty"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(CoreError::invalid_collection_name(
            name,
            format!("character {bad:?} not allowed"),
        ));
    }
    if name.starts_with('_') || name.starts_with('-') {
        return Err(CoreError::invalid_collection_name(
            name,
            "must start with a letter or digit",
        ));
    }
    Ok(())
}
