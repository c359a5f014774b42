//! On-disk layout of a collection.
//!
//! ```text
//! {
//!   "auto_id": 3,
//!   "records": [ { "id": 1, ... }, { "id": 3, ... } ]
//! }
//! ```
//!
//! `auto_id` is the last identifier handed out; it never decreases, so
//! identifiers of deleted documents are not reused.

use crate::document::{document_id, Document};
use serde::{Deserialize, Serialize};

/// Durable state of one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct CollectionData {
    /// Last assigned identifier.
    #[serde(rename = "auto_id", alias = "counter", default)]
    pub counter: u64,
    /// Documents in creation order.
    #[serde(default)]
    pub records: Vec<Document>,
}

impl CollectionData {
    /// Parses a persisted collection.
    pub fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Serializes the collection, indented when `pretty` is set.
    pub fn encode(&self, pretty: bool) -> serde_json::Result<Vec<u8>> {
        if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        }
    }

    /// Hands out the next identifier, or `None` once the id space is used up.
    pub fn next_id(&mut self) -> Option<u64> {
        self.counter = self.counter.checked_add(1)?;
        Some(self.counter)
    }

    /// Raises the counter to at least the largest stored id.
    ///
    /// Returns the previous counter if it had to move.
    pub fn repair_counter(&mut self) -> Option<u64> {
        let floor = self.max_record_id();
        if self.counter >= floor {
            return None;
        }
        let previous = self.counter;
        self.counter = floor;
        Some(previous)
    }

    /// Position of the document with `id`.
    pub fn position(&self, id: u64) -> Option<usize> {
        self.records
            .iter()
            .position(|doc| document_id(doc) == Some(id))
    }

    /// Largest identifier present in the records.
    pub fn max_record_id(&self) -> u64 {
        self.records
            .iter()
            .filter_map(document_id)
            .max()
            .unwrap_or(0)
    }
}
