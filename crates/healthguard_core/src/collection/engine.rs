//! Collection implementation.

use crate::backup::{BackupEntry, BackupManager};
use crate::collection::format::CollectionData;
use crate::collection::query::{compare_values, search_matches, Filter};
use crate::document::{
    document_id, now_timestamp, Document, DocumentId, CREATED_AT_FIELD, ID_FIELD,
    UPDATED_AT_FIELD,
};
use crate::error::{CoreError, CoreResult};
use crate::stats::CollectionStats;
use healthguard_storage::{InMemoryBackend, StorageBackend};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// A named, independently locked set of documents backed by one durable unit.
///
/// Every public operation holds the collection's lock for its whole
/// read-modify-write cycle, so operations on the same collection are
/// serialized. Different collections never share a lock.
///
/// # Writes
///
/// A mutating operation builds the next state, snapshots the current durable
/// unit through the [`BackupManager`] (best-effort), then replaces the durable
/// unit. Only after that write succeeds does the in-memory state change, so
/// readers observe either the prior state or the new one.
///
/// # Example
///
/// ```rust
/// use healthguard_core::{Collection, Filter};
/// use serde_json::json;
///
/// let appointments = Collection::in_memory("appointments").unwrap();
/// let doc = healthguard_core::into_document(json!({"patient": 4, "status": "booked"})).unwrap();
///
/// let stored = appointments.create(doc).unwrap();
/// assert_eq!(stored["id"], 1);
///
/// let booked = appointments.filter(&Filter::new().eq("status", "booked"));
/// assert_eq!(booked.len(), 1);
/// ```
pub struct Collection {
    /// Collection name, immutable.
    name: String,
    /// Durable state and the means to persist it.
    inner: Mutex<Inner>,
    /// Operation counters.
    stats: CollectionStats,
}

/// Lock-guarded part of a collection.
struct Inner {
    data: CollectionData,
    backend: Box<dyn StorageBackend>,
    backups: Option<BackupManager>,
    pretty: bool,
}

/// Point-in-time description of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    /// Collection name.
    pub name: String,
    /// Number of stored documents.
    pub records: usize,
    /// Last assigned identifier.
    pub counter: u64,
    /// Size of the durable unit in bytes.
    pub size_bytes: u64,
    /// Where the durable unit lives.
    pub location: String,
    /// Whether the durable unit has been written at least once.
    pub persisted: bool,
}

impl Collection {
    /// Opens a collection over `backend`.
    ///
    /// If the backend has never been written, it is initialized with an empty
    /// state (counter 0, no records). If its contents cannot be read or parsed,
    /// the collection starts empty and the durable unit is left untouched
    /// until the next write.
    ///
    /// # Errors
    ///
    /// Returns an error only if initializing a missing durable unit fails.
    pub fn open(
        name: impl Into<String>,
        mut backend: Box<dyn StorageBackend>,
        backups: Option<BackupManager>,
        pretty: bool,
    ) -> CoreResult<Self> {
        let name = name.into();

        let mut data = match backend.read_all() {
            Ok(Some(bytes)) => CollectionData::decode(&bytes).unwrap_or_else(|e| {
                warn!(
                    collection = %name,
                    location = %backend.describe(),
                    error = %e,
                    "collection file unreadable, treating as empty"
                );
                CollectionData::default()
            }),
            Ok(None) => {
                let empty = CollectionData::default();
                backend.write_all(&empty.encode(pretty)?)?;
                info!(collection = %name, location = %backend.describe(), "initialized empty collection");
                empty
            }
            Err(e) => {
                warn!(
                    collection = %name,
                    location = %backend.describe(),
                    error = %e,
                    "collection file could not be read, treating as empty"
                );
                CollectionData::default()
            }
        };

        if let Some(stored) = data.repair_counter() {
            warn!(
                collection = %name,
                stored,
                repaired = data.counter,
                "stored counter behind largest record id, raised"
            );
        }

        debug!(
            collection = %name,
            records = data.records.len(),
            counter = data.counter,
            "collection opened"
        );

        Ok(Self {
            name,
            inner: Mutex::new(Inner {
                data,
                backend,
                backups,
                pretty,
            }),
            stats: CollectionStats::new(),
        })
    }

    /// Opens an ephemeral collection with no durable file and no backups.
    pub fn in_memory(name: impl Into<String>) -> CoreResult<Self> {
        Self::open(name, Box::new(InMemoryBackend::new()), None, false)
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the operation counters.
    #[must_use]
    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }

    /// Returns the last assigned identifier.
    #[must_use]
    pub fn counter(&self) -> u64 {
        self.inner.lock().data.counter
    }

    // === Writes ===

    /// Stores a new document and returns the stored copy.
    ///
    /// The next identifier is assigned (any caller-supplied `id` is replaced)
    /// and `created_at`/`updated_at` are set to now unless already present.
    ///
    /// # Errors
    ///
    /// - `IdsExhausted` if the counter is already at `u64::MAX`
    /// - storage errors if the durable unit cannot be written
    pub fn create(&self, document: Document) -> CoreResult<Document> {
        let mut inner = self.inner.lock();
        let mut next = inner.data.clone();

        let now = now_timestamp();
        let stored = stamp_new(&self.name, &mut next, document, &now)?;
        next.records.push(stored.clone());

        inner.commit(&self.name, next, &self.stats)?;
        self.stats.record_creates(1);
        Ok(stored)
    }

    /// Stores several documents with one snapshot and one write.
    ///
    /// Identifiers are assigned sequentially in input order. Readers observe
    /// either none of the batch or all of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the id space runs out partway through the batch or
    /// the durable unit cannot be written; nothing from the batch is stored
    /// in either case.
    pub fn bulk_create(&self, documents: Vec<Document>) -> CoreResult<Vec<Document>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut inner = self.inner.lock();
        let mut next = inner.data.clone();

        let now = now_timestamp();
        let mut created = Vec::with_capacity(documents.len());
        for document in documents {
            let stored = stamp_new(&self.name, &mut next, document, &now)?;
            next.records.push(stored.clone());
            created.push(stored);
        }

        inner.commit(&self.name, next, &self.stats)?;
        self.stats.record_creates(created.len() as u64);
        Ok(created)
    }

    /// Shallow-merges `changes` into the document with `id`.
    ///
    /// Fields present in `changes` replace the stored ones; other fields are
    /// untouched. `id` and `created_at` cannot be changed and are ignored.
    /// `updated_at` is always refreshed.
    ///
    /// Returns `None` if no document has that identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable unit cannot be written.
    pub fn update(&self, id: DocumentId, changes: Document) -> CoreResult<Option<Document>> {
        let mut inner = self.inner.lock();
        let Some(pos) = inner.data.position(id) else {
            return Ok(None);
        };

        let mut next = inner.data.clone();
        let record = &mut next.records[pos];
        for (field, value) in changes {
            if field == ID_FIELD || field == CREATED_AT_FIELD {
                continue;
            }
            record.insert(field, value);
        }
        record.insert(UPDATED_AT_FIELD.to_string(), Value::from(now_timestamp()));
        let updated = record.clone();

        inner.commit(&self.name, next, &self.stats)?;
        self.stats.record_update();
        Ok(Some(updated))
    }

    /// Removes the document with `id`.
    ///
    /// Returns whether a document was removed. Nothing is written when the
    /// identifier is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable unit cannot be written.
    pub fn delete(&self, id: DocumentId) -> CoreResult<bool> {
        Ok(self.remove_where(|doc_id| doc_id == id)? > 0)
    }

    /// Removes every document whose identifier is in `ids`.
    ///
    /// Returns how many documents were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable unit cannot be written.
    pub fn bulk_delete(&self, ids: &[DocumentId]) -> CoreResult<usize> {
        let ids: HashSet<DocumentId> = ids.iter().copied().collect();
        self.remove_where(|doc_id| ids.contains(&doc_id))
    }

    fn remove_where(&self, doomed: impl Fn(DocumentId) -> bool) -> CoreResult<usize> {
        let mut inner = self.inner.lock();

        let mut next = inner.data.clone();
        let before = next.records.len();
        next.records
            .retain(|doc| !document_id(doc).is_some_and(|id| doomed(id)));
        let removed = before - next.records.len();

        if removed == 0 {
            return Ok(0);
        }

        inner.commit(&self.name, next, &self.stats)?;
        self.stats.record_deletes(removed as u64);
        Ok(removed)
    }

    // === Reads ===

    /// Returns the document with `id`, if present.
    #[must_use]
    pub fn get(&self, id: DocumentId) -> Option<Document> {
        let inner = self.inner.lock();
        self.stats.record_read();
        inner
            .data
            .position(id)
            .map(|pos| inner.data.records[pos].clone())
    }

    /// Returns every document in stored order.
    #[must_use]
    pub fn get_all(&self) -> Vec<Document> {
        let inner = self.inner.lock();
        self.stats.record_read();
        inner.data.records.clone()
    }

    /// Returns the documents matching every condition of `filter`.
    #[must_use]
    pub fn filter(&self, filter: &Filter) -> Vec<Document> {
        self.filter_fn(|doc| filter.matches(doc))
    }

    /// Returns the documents for which `predicate` is true.
    ///
    /// The predicate runs while the collection lock is held; it must not
    /// call back into the same collection.
    #[must_use]
    pub fn filter_fn<F>(&self, predicate: F) -> Vec<Document>
    where
        F: Fn(&Document) -> bool,
    {
        let inner = self.inner.lock();
        self.stats.record_read();
        inner
            .data
            .records
            .iter()
            .filter(|doc| predicate(doc))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over string-typed `fields`.
    ///
    /// A document matches if any of the named fields contains `query`.
    #[must_use]
    pub fn search(&self, fields: &[&str], query: &str) -> Vec<Document> {
        let needle = query.to_lowercase();
        self.filter_fn(|doc| search_matches(doc, fields, &needle))
    }

    /// Returns the first matching document in stored order.
    #[must_use]
    pub fn first(&self, filter: &Filter) -> Option<Document> {
        let inner = self.inner.lock();
        self.stats.record_read();
        inner
            .data
            .records
            .iter()
            .find(|doc| filter.matches(doc))
            .cloned()
    }

    /// Counts matching documents. An empty filter counts everything.
    #[must_use]
    pub fn count(&self, filter: &Filter) -> usize {
        let inner = self.inner.lock();
        self.stats.record_read();
        if filter.is_empty() {
            return inner.data.records.len();
        }
        inner
            .data
            .records
            .iter()
            .filter(|doc| filter.matches(doc))
            .count()
    }

    /// Returns whether any document matches.
    #[must_use]
    pub fn exists(&self, filter: &Filter) -> bool {
        self.count(filter) > 0
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().data.records.len()
    }

    /// Returns whether the collection holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every document sorted by `field`.
    ///
    /// Missing fields sort as the empty string. The sort is stable in both
    /// directions: documents with equal keys keep their stored order.
    #[must_use]
    pub fn order_by(&self, field: &str, reverse: bool) -> Vec<Document> {
        let mut records = self.get_all();
        records.sort_by(|a, b| {
            let ord = compare_values(a.get(field), b.get(field));
            if reverse {
                ord.reverse()
            } else {
                ord
            }
        });
        records
    }

    // === Maintenance ===

    /// Describes the collection's current size and location.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable unit's size cannot be read.
    pub fn summary(&self) -> CoreResult<CollectionSummary> {
        let inner = self.inner.lock();
        Ok(CollectionSummary {
            name: self.name.clone(),
            records: inner.data.records.len(),
            counter: inner.data.counter,
            size_bytes: inner.backend.size()?,
            location: inner.backend.describe(),
            persisted: inner.backend.exists(),
        })
    }

    /// Lists this collection's snapshots, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot directory cannot be listed.
    pub fn list_backups(&self) -> CoreResult<Vec<BackupEntry>> {
        let inner = self.inner.lock();
        match &inner.backups {
            Some(manager) => Ok(manager.list()?),
            None => Ok(Vec::new()),
        }
    }

    /// Replaces the collection's state with its newest snapshot.
    ///
    /// The state being replaced is itself snapshotted first, so a restore can
    /// be undone by restoring again. The counter never moves backwards:
    /// identifiers handed out after the snapshot was taken stay retired.
    ///
    /// Returns the number of documents restored.
    ///
    /// # Errors
    ///
    /// - `BackupNotFound` if the collection has no snapshots
    /// - `CorruptBackup` if the newest snapshot cannot be parsed
    /// - storage errors if the restored state cannot be written
    pub fn restore_latest_backup(&self) -> CoreResult<usize> {
        let mut inner = self.inner.lock();

        let (entry, bytes) = {
            let manager = inner
                .backups
                .as_ref()
                .ok_or_else(|| CoreError::backup_not_found(&self.name))?;
            let entry = manager
                .latest()?
                .ok_or_else(|| CoreError::backup_not_found(&self.name))?;
            let bytes = manager.read(&entry)?;
            (entry, bytes)
        };

        let mut restored = CollectionData::decode(&bytes)
            .map_err(|e| CoreError::corrupt_backup(&entry.file_name, e.to_string()))?;
        restored.counter = restored
            .counter
            .max(inner.data.counter)
            .max(restored.max_record_id());
        let count = restored.records.len();

        inner.commit(&self.name, restored, &self.stats)?;
        info!(collection = %self.name, file = %entry.file_name, records = count, "restored from backup");
        Ok(count)
    }
}

impl Inner {
    /// Snapshots the current durable unit, writes `next`, then adopts it.
    fn commit(
        &mut self,
        name: &str,
        next: CollectionData,
        stats: &CollectionStats,
    ) -> CoreResult<()> {
        let bytes = next.encode(self.pretty)?;

        self.snapshot(name, stats);

        if let Err(e) = self.backend.write_all(&bytes) {
            stats.record_persist_failure();
            return Err(e.into());
        }
        stats.record_persist(bytes.len() as u64);

        self.data = next;
        debug!(
            collection = name,
            bytes = bytes.len(),
            records = self.data.records.len(),
            "collection persisted"
        );
        Ok(())
    }

    /// Best-effort snapshot of the current durable unit.
    fn snapshot(&mut self, name: &str, stats: &CollectionStats) {
        let Some(manager) = self.backups.as_mut() else {
            return;
        };

        let current = match self.backend.read_all() {
            Ok(Some(bytes)) => bytes,
            // Nothing durable yet.
            Ok(None) => return,
            Err(e) => {
                warn!(collection = name, error = %e, "backup skipped, current state unreadable");
                stats.record_backup_failure();
                return;
            }
        };

        match manager.snapshot(&current) {
            Ok(Some(_)) => stats.record_backup(),
            Ok(None) => {}
            Err(e) => {
                warn!(collection = name, error = %e, "backup failed, continuing with write");
                stats.record_backup_failure();
            }
        }
    }
}

/// Builds the stored form of a new document: fresh `id` first, then the
/// caller's fields, then default timestamps.
fn stamp_new(
    name: &str,
    data: &mut CollectionData,
    document: Document,
    now: &str,
) -> CoreResult<Document> {
    let id = data
        .next_id()
        .ok_or_else(|| CoreError::ids_exhausted(name))?;

    let mut stored = Document::new();
    stored.insert(ID_FIELD.to_string(), Value::from(id));
    for (field, value) in document {
        if field != ID_FIELD {
            stored.insert(field, value);
        }
    }
    stored
        .entry(CREATED_AT_FIELD)
        .or_insert_with(|| Value::from(now));
    stored
        .entry(UPDATED_AT_FIELD)
        .or_insert_with(|| Value::from(now));
    Ok(stored)
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("records", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::into_document;
    use healthguard_storage::{FileBackend, StorageError, StorageResult};
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn doc(value: Value) -> Document {
        into_document(value).unwrap()
    }

    fn file_collection(dir: &std::path::Path, name: &str) -> Collection {
        let backend = FileBackend::open(&dir.join(format!("{name}.json"))).unwrap();
        let backups = BackupManager::new(name, dir.join("_backups").join(name), 3);
        Collection::open(name, Box::new(backend), Some(backups), true).unwrap()
    }

    /// Backend whose writes fail once armed.
    struct FailingBackend {
        inner: InMemoryBackend,
        fail: std::sync::Arc<std::sync::atomic::AtomicBool>,
    }

    impl StorageBackend for FailingBackend {
        fn read_all(&self) -> StorageResult<Option<Vec<u8>>> {
            self.inner.read_all()
        }

        fn write_all(&mut self, data: &[u8]) -> StorageResult<()> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StorageError::persist(
                    "failing",
                    std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                ));
            }
            self.inner.write_all(data)
        }

        fn exists(&self) -> bool {
            self.inner.exists()
        }

        fn size(&self) -> StorageResult<u64> {
            self.inner.size()
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    #[test]
    fn create_assigns_ids_and_timestamps() {
        let users = Collection::in_memory("users").unwrap();

        let a = users.create(doc(json!({"username": "amara"}))).unwrap();
        let b = users.create(doc(json!({"username": "bola"}))).unwrap();

        assert_eq!(document_id(&a), Some(1));
        assert_eq!(document_id(&b), Some(2));
        assert!(a[CREATED_AT_FIELD].is_string());
        assert_eq!(a[CREATED_AT_FIELD], a[UPDATED_AT_FIELD]);
        assert_eq!(a.keys().next().map(String::as_str), Some(ID_FIELD));
    }

    #[test]
    fn create_replaces_caller_id_and_keeps_caller_timestamps() {
        let users = Collection::in_memory("users").unwrap();

        let stored = users
            .create(doc(json!({"id": 99, "created_at": "2024-01-01T00:00:00"})))
            .unwrap();

        assert_eq!(document_id(&stored), Some(1));
        assert_eq!(stored[CREATED_AT_FIELD], "2024-01-01T00:00:00");
        assert!(stored[UPDATED_AT_FIELD].is_string());
    }

    #[test]
    fn create_returns_a_copy() {
        let users = Collection::in_memory("users").unwrap();

        let mut stored = users.create(doc(json!({"name": "a"}))).unwrap();
        stored.insert("name".into(), json!("mutated"));

        assert_eq!(users.get(1).unwrap()["name"], "a");
    }

    #[test]
    fn get_returns_created_document() {
        let records = Collection::in_memory("medical_records").unwrap();
        let created = records
            .create(doc(json!({"patient": 3, "diagnosis": "flu"})))
            .unwrap();

        assert_eq!(records.get(1), Some(created));
        assert!(records.get(2).is_none());
    }

    #[test]
    fn ids_are_never_reused() {
        let users = Collection::in_memory("users").unwrap();
        users.create(doc(json!({}))).unwrap();
        users.create(doc(json!({}))).unwrap();

        assert!(users.delete(2).unwrap());
        let next = users.create(doc(json!({}))).unwrap();

        assert_eq!(document_id(&next), Some(3));
        assert_eq!(users.counter(), 3);
    }

    #[test]
    fn update_merges_fields() {
        let rx = Collection::in_memory("prescriptions").unwrap();
        let created = rx
            .create(doc(json!({"drug": "amoxicillin", "dose": "250mg", "active": true})))
            .unwrap();

        let updated = rx
            .update(1, doc(json!({"dose": "500mg", "notes": "after meals"})))
            .unwrap()
            .unwrap();

        assert_eq!(updated["dose"], "500mg");
        assert_eq!(updated["notes"], "after meals");
        assert_eq!(updated["drug"], "amoxicillin");
        assert_eq!(updated["active"], true);
        assert!(
            updated[UPDATED_AT_FIELD].as_str().unwrap()
                >= created[UPDATED_AT_FIELD].as_str().unwrap()
        );
        assert_eq!(rx.get(1), Some(updated));
    }

    #[test]
    fn update_cannot_change_id_or_created_at() {
        let rx = Collection::in_memory("prescriptions").unwrap();
        let created = rx.create(doc(json!({"drug": "x"}))).unwrap();

        let updated = rx
            .update(1, doc(json!({"id": 50, "created_at": "1999-01-01"})))
            .unwrap()
            .unwrap();

        assert_eq!(document_id(&updated), Some(1));
        assert_eq!(updated[CREATED_AT_FIELD], created[CREATED_AT_FIELD]);
        assert!(rx.get(50).is_none());
    }

    #[test]
    fn update_missing_document_writes_nothing() {
        let rx = Collection::in_memory("prescriptions").unwrap();
        let persists = rx.stats().persists();

        assert!(rx.update(7, doc(json!({"a": 1}))).unwrap().is_none());
        assert_eq!(rx.stats().persists(), persists);
    }

    #[test]
    fn delete_semantics() {
        let users = Collection::in_memory("users").unwrap();
        users.create(doc(json!({}))).unwrap();

        assert!(users.delete(1).unwrap());
        assert!(users.get(1).is_none());
        assert!(!users.delete(1).unwrap());
        assert!(!users.delete(42).unwrap());
    }

    #[test]
    fn bulk_create_uses_one_write() {
        let meds = Collection::in_memory("medications").unwrap();
        let persists = meds.stats().persists();

        let created = meds
            .bulk_create(vec![
                doc(json!({"name": "a"})),
                doc(json!({"name": "b"})),
                doc(json!({"name": "c"})),
            ])
            .unwrap();

        let ids: Vec<_> = created.iter().filter_map(document_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(meds.stats().persists(), persists + 1);
        assert_eq!(meds.len(), 3);
    }

    #[test]
    fn bulk_create_empty_is_noop() {
        let meds = Collection::in_memory("medications").unwrap();
        assert!(meds.bulk_create(Vec::new()).unwrap().is_empty());
        assert_eq!(meds.counter(), 0);
    }

    #[test]
    fn bulk_delete_counts_removed() {
        let meds = Collection::in_memory("medications").unwrap();
        meds.bulk_create((0..5).map(|i| doc(json!({"n": i}))).collect())
            .unwrap();
        let persists = meds.stats().persists();

        assert_eq!(meds.bulk_delete(&[1, 3, 3, 99]).unwrap(), 2);
        assert_eq!(meds.stats().persists(), persists + 1);
        assert_eq!(meds.bulk_delete(&[1, 3]).unwrap(), 0);
        assert_eq!(meds.stats().persists(), persists + 1);

        let left: Vec<_> = meds.get_all().iter().filter_map(document_id).collect();
        assert_eq!(left, vec![2, 4, 5]);
    }

    #[test]
    fn filter_count_exists_first() {
        let appts = Collection::in_memory("appointments").unwrap();
        appts
            .bulk_create(vec![
                doc(json!({"doctor": 1, "status": "booked"})),
                doc(json!({"doctor": 2, "status": "booked"})),
                doc(json!({"doctor": 1, "status": "cancelled"})),
            ])
            .unwrap();

        let booked = Filter::new().eq("status", "booked");
        assert_eq!(appts.filter(&booked).len(), 2);
        assert_eq!(appts.count(&booked), 2);
        assert_eq!(appts.count(&Filter::new()), 3);
        assert!(appts.exists(&Filter::new().eq("doctor", 2)));
        assert!(!appts.exists(&Filter::new().eq("doctor", 3)));

        let first = appts.first(&Filter::new().eq("doctor", 1)).unwrap();
        assert_eq!(document_id(&first), Some(1));
        assert!(appts.first(&Filter::new().eq("doctor", 9)).is_none());
    }

    #[test]
    fn filter_fn_supports_ranges() {
        let metrics = Collection::in_memory("health_metrics").unwrap();
        metrics
            .bulk_create(
                [110, 135, 150, 120]
                    .iter()
                    .map(|v| doc(json!({"systolic": v})))
                    .collect(),
            )
            .unwrap();

        let high = metrics.filter_fn(|d| d["systolic"].as_i64().unwrap_or(0) >= 130);
        assert_eq!(high.len(), 2);
    }

    #[test]
    fn search_matches_any_named_field() {
        let clinics = Collection::in_memory("clinics").unwrap();
        clinics
            .bulk_create(vec![
                doc(json!({"name": "Lakeside Clinic", "city": "Kisumu"})),
                doc(json!({"name": "Hillview", "city": "Nakuru"})),
                doc(json!({"name": "Riverbend", "city": "LAKE town", "beds": 40})),
            ])
            .unwrap();

        let hits = clinics.search(&["name", "city"], "lake");
        let ids: Vec<_> = hits.iter().filter_map(document_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(clinics.search(&["beds"], "40").is_empty());
    }

    #[test]
    fn order_by_is_stable_and_handles_missing_fields() {
        let widgets = Collection::in_memory("widgets").unwrap();
        widgets
            .bulk_create(vec![
                doc(json!({"name": "b", "tag": 1})),
                doc(json!({"tag": 2})),
                doc(json!({"name": "a", "tag": 3})),
                doc(json!({"name": "b", "tag": 4})),
            ])
            .unwrap();

        let tags = |docs: Vec<Document>| -> Vec<i64> {
            docs.iter().map(|d| d["tag"].as_i64().unwrap()).collect()
        };

        assert_eq!(tags(widgets.order_by("name", false)), vec![2, 3, 1, 4]);
        assert_eq!(tags(widgets.order_by("name", true)), vec![1, 4, 3, 2]);
        assert_eq!(tags(widgets.order_by("absent", false)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn open_initializes_missing_unit() {
        let backend = InMemoryBackend::new();
        let observer = backend.clone();

        let users = Collection::open("users", Box::new(backend), None, false).unwrap();
        assert!(users.is_empty());
        assert_eq!(
            observer.data().unwrap(),
            br#"{"auto_id":0,"records":[]}"#.to_vec()
        );
    }

    #[test]
    fn open_without_counter_continues_after_largest_id() {
        let backend = InMemoryBackend::with_data(br#"{"records":[{"id":1},{"id":2}]}"#.to_vec());
        let users = Collection::open("users", Box::new(backend), None, false).unwrap();
        assert_eq!(users.counter(), 2);

        let next = users.create(doc(json!({"username": "c"}))).unwrap();
        assert_eq!(document_id(&next), Some(3));

        let ids: Vec<_> = users.get_all().iter().filter_map(document_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn open_with_stale_counter_never_reissues_ids() {
        let backend = InMemoryBackend::with_data(
            br#"{"auto_id":1,"records":[{"id":1},{"id":2,"username":"kept"}]}"#.to_vec(),
        );
        let users = Collection::open("users", Box::new(backend), None, false).unwrap();

        let next = users.create(doc(json!({"username": "new"}))).unwrap();
        assert_eq!(document_id(&next), Some(3));
        assert_eq!(users.get(2).unwrap()["username"], "kept");
    }

    #[test]
    fn exhausted_counter_is_an_error_not_an_overflow() {
        let backend = InMemoryBackend::with_data(
            format!(r#"{{"auto_id":{},"records":[]}}"#, u64::MAX).into_bytes(),
        );
        let observer = backend.clone();
        let users = Collection::open("users", Box::new(backend), None, false).unwrap();
        let persists = users.stats().persists();

        assert!(matches!(
            users.create(doc(json!({}))),
            Err(CoreError::IdsExhausted { .. })
        ));
        assert!(matches!(
            users.bulk_create(vec![doc(json!({}))]),
            Err(CoreError::IdsExhausted { .. })
        ));

        assert!(users.is_empty());
        assert_eq!(users.counter(), u64::MAX);
        assert_eq!(users.stats().persists(), persists);
        let persisted = CollectionData::decode(&observer.data().unwrap()).unwrap();
        assert_eq!(persisted.counter, u64::MAX);
    }

    #[test]
    fn corrupted_unit_loads_empty_and_is_kept_until_write() {
        let backend = InMemoryBackend::with_data(b"{ not json".to_vec());
        let observer = backend.clone();

        let users = Collection::open("users", Box::new(backend), None, false).unwrap();
        assert!(users.is_empty());
        assert_eq!(users.counter(), 0);
        assert_eq!(observer.data().unwrap(), b"{ not json".to_vec());

        users.create(doc(json!({"a": 1}))).unwrap();
        let persisted = CollectionData::decode(&observer.data().unwrap()).unwrap();
        assert_eq!(persisted.records.len(), 1);
    }

    #[test]
    fn persist_failure_is_surfaced_and_state_unchanged() {
        let fail = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let backend = FailingBackend {
            inner: InMemoryBackend::new(),
            fail: fail.clone(),
        };
        let users = Collection::open("users", Box::new(backend), None, false).unwrap();
        users.create(doc(json!({"n": 1}))).unwrap();

        fail.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(matches!(
            users.create(doc(json!({"n": 2}))),
            Err(CoreError::Storage(_))
        ));
        assert!(users.update(1, doc(json!({"n": 5}))).is_err());
        assert!(users.delete(1).is_err());

        assert_eq!(users.len(), 1);
        assert_eq!(users.counter(), 1);
        assert_eq!(users.get(1).unwrap()["n"], 1);
        assert_eq!(users.stats().persist_failures(), 3);

        // The lock was released on every error path.
        fail.store(false, std::sync::atomic::Ordering::SeqCst);
        let next = users.create(doc(json!({"n": 3}))).unwrap();
        assert_eq!(document_id(&next), Some(2));
    }

    #[test]
    fn file_collection_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let users = file_collection(dir.path(), "users");
            users.create(doc(json!({"username": "amara"}))).unwrap();
            users.create(doc(json!({"username": "bola"}))).unwrap();
            users.delete(2).unwrap();
        }

        let users = file_collection(dir.path(), "users");
        assert_eq!(users.len(), 1);
        assert_eq!(users.counter(), 2);
        assert_eq!(users.get(1).unwrap()["username"], "amara");
    }

    #[test]
    fn writes_snapshot_previous_state() {
        let dir = tempdir().unwrap();
        let users = file_collection(dir.path(), "users");

        for i in 0..5 {
            users.create(doc(json!({"n": i}))).unwrap();
        }

        let backups = users.list_backups().unwrap();
        assert_eq!(backups.len(), 3);
        assert_eq!(users.stats().backups(), 5);

        // Newest snapshot holds the state before the fifth create.
        let newest = fs::read(&backups[2].path).unwrap();
        let data = CollectionData::decode(&newest).unwrap();
        assert_eq!(data.records.len(), 4);
        assert_eq!(data.counter, 4);
    }

    #[test]
    fn backup_failure_does_not_block_write() {
        let dir = tempdir().unwrap();
        // A regular file where the snapshot directory should be.
        fs::write(dir.path().join("blocked"), b"").unwrap();

        let backend = FileBackend::open(&dir.path().join("users.json")).unwrap();
        let backups = BackupManager::new("users", dir.path().join("blocked"), 3);
        let users = Collection::open("users", Box::new(backend), Some(backups), true).unwrap();

        users.create(doc(json!({"n": 1}))).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users.stats().backup_failures(), 1);
        assert_eq!(users.stats().backups(), 0);
    }

    #[test]
    fn restore_latest_backup_rolls_back_one_write() {
        let dir = tempdir().unwrap();
        let users = file_collection(dir.path(), "users");
        users.create(doc(json!({"n": 1}))).unwrap();
        users.create(doc(json!({"n": 2}))).unwrap();

        assert_eq!(users.restore_latest_backup().unwrap(), 1);
        assert!(users.get(2).is_none());
        assert_eq!(users.counter(), 2);

        let next = users.create(doc(json!({"n": 3}))).unwrap();
        assert_eq!(document_id(&next), Some(3));
    }

    #[test]
    fn restore_without_backups_fails() {
        let users = Collection::in_memory("users").unwrap();
        assert!(matches!(
            users.restore_latest_backup(),
            Err(CoreError::BackupNotFound { .. })
        ));
    }

    #[test]
    fn summary_reports_size_and_counts() {
        let dir = tempdir().unwrap();
        let users = file_collection(dir.path(), "users");
        users.create(doc(json!({"n": 1}))).unwrap();

        let summary = users.summary().unwrap();
        assert_eq!(summary.name, "users");
        assert_eq!(summary.records, 1);
        assert_eq!(summary.counter, 1);
        assert!(summary.size_bytes > 0);
        assert!(summary.location.ends_with("users.json"));
        assert!(summary.persisted);
    }
}
