//! Linear-scan query primitives.
//!
//! Every query is a full scan over the collection's records in stored order.
//! There are no indexes and no planner.

use crate::document::Document;
use serde_json::Value;
use std::cmp::Ordering;

/// Exact-match conjunction of field/value pairs.
///
/// A document matches when every condition holds. A missing field compares
/// as JSON `null`. Numbers compare by value, so `1` matches `1.0`.
///
/// # Example
///
/// ```rust
/// use healthguard_core::Filter;
///
/// let active_for_patient = Filter::new().eq("patient", 12).eq("status", "active");
/// assert!(!active_for_patient.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Creates an empty filter, which matches every document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `field == value` condition.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Returns whether the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns the conditions in insertion order.
    #[must_use]
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Returns whether `doc` satisfies every condition.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| values_equal(doc.get(field).unwrap_or(&Value::Null), expected))
    }
}

impl<K, V> FromIterator<(K, V)> for Filter
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            conditions: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// JSON equality with numeric values compared by magnitude.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        _ => a == b,
    }
}

/// Case-insensitive substring match over string-typed fields.
///
/// `needle` must already be lowercased.
pub(crate) fn search_matches(doc: &Document, fields: &[&str], needle: &str) -> bool {
    fields.iter().any(|field| {
        doc.get(*field)
            .and_then(Value::as_str)
            .is_some_and(|s| s.to_lowercase().contains(needle))
    })
}

/// Rank used to order values of different JSON types.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::Null | Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over optional JSON values used by `order_by`.
///
/// Missing fields and `null` sort as the empty string. Values of different
/// types sort by type: booleans, numbers, strings, arrays, objects.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);

    match type_rank(a).cmp(&type_rank(b)) {
        Ordering::Equal => {}
        other => return other,
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x.cmp(&y)
            } else {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.total_cmp(&y)
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            for (xa, ya) in x.iter().zip(y.iter()) {
                match compare_values(Some(xa), Some(ya)) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(_), Value::Object(_)) => Ordering::Equal,
        _ => as_sort_str(a).cmp(as_sort_str(b)),
    }
}

fn as_sort_str(value: &Value) -> &str {
    value.as_str().unwrap_or("")
}
