//! Document collections.
//!
//! A [`Collection`] owns one durable unit and serializes every operation on
//! it behind its own lock. Queries are linear scans built from [`Filter`],
//! free-form predicates, substring search, and single-field ordering.

mod engine;
mod format;
mod query;

pub use engine::{Collection, CollectionSummary};
pub use query::Filter;
