//! Common types for sage-store.

use serde::{Deserialize, Serialize};

/// Unique identifier for a record in a collection.
pub type RecordKey = String;

/// Declaration of a non-unique secondary index on a collection.
///
/// An index maps the string value found at `field` in each record to the
/// set of record keys carrying that value. Records that lack the field, or
/// whose field is not a JSON string, are simply not indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Name the index is looked up by (e.g. `"by-document"`).
    pub name: String,
    /// Top-level record field the index extracts (e.g. `"document_id"`).
    pub field: String,
}

impl IndexSpec {
    /// Create a new index specification.
    pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
        }
    }
}

/// Statistics about a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Name of the collection.
    pub name: String,
    /// Number of records in the collection.
    pub record_count: usize,
    /// Names of the secondary indexes.
    pub indexes: Vec<String>,
}
