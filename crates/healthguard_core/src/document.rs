//! Documents and the fields the store manages on them.
//!
//! A [`Document`] is a schema-less, insertion-ordered JSON object. The store
//! owns three fields on every document:
//!
//! - `id` - positive integer assigned at creation, never reassigned
//! - `created_at` - ISO-8601 timestamp, set once
//! - `updated_at` - ISO-8601 timestamp, refreshed on every update
//!
//! Everything else belongs to the calling layer.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

/// A stored document: field name to JSON value.
pub type Document = Map<String, Value>;

/// Identifier assigned to a document by its collection.
pub type DocumentId = u64;

/// Field holding the document identifier.
pub const ID_FIELD: &str = "id";
/// Field holding the creation timestamp.
pub const CREATED_AT_FIELD: &str = "created_at";
/// Field holding the last-update timestamp.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Current time as an ISO-8601 string with microsecond precision.
///
/// The width is fixed, so lexicographic order equals chronological order.
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Returns the identifier of a document, if it carries a valid one.
#[must_use]
pub fn document_id(doc: &Document) -> Option<DocumentId> {
    doc.get(ID_FIELD).and_then(Value::as_u64)
}

/// Converts a JSON value into a document.
///
/// Returns `None` for anything other than a JSON object.
#[must_use]
pub fn into_document(value: Value) -> Option<Document> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
