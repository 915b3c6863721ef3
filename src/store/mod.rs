//! Persistence gateway: collection-scoped document storage.
//!
//! The gateway stores JSON documents keyed by `(collection, id)` and supports
//! predicate-filtered queries with AND/OR combination. Single-document
//! operations are atomic; nothing spans documents, and no cross-document
//! transaction exists anywhere above this layer.
//!
//! Backends:
//! - [`DiskStore`]: redb-backed, one file, documents as serde_json bytes
//! - [`MemoryStore`]: in-process map, used by tests

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Storage errors. Callers treat every variant as a generic storage failure;
/// the split exists for log labeling.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Predicate operator for filtered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
}

/// How multiple filters combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    And,
    Or,
}

/// A single field predicate.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    /// Equality predicate on a top-level field.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }
}

/// Collection-scoped document storage.
///
/// `create` assigns a fresh id, injects it as the document's `id` field and
/// returns it. `set` with `merge` performs a shallow field merge over the
/// existing document (creating it if absent); without `merge` it replaces the
/// document wholesale.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, collection: &str, doc: Value) -> Result<String, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    async fn set(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        merge: bool,
    ) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    async fn find(
        &self,
        collection: &str,
        filters: &[Filter],
        combine: Combine,
    ) -> Result<Vec<Value>, StoreError>;

    async fn delete_where(&self, collection: &str, filters: &[Filter])
    -> Result<(), StoreError>;
}

/// Composite key shared by both backends: `collection\0id`.
pub(crate) fn doc_key(collection: &str, id: &str) -> String {
    format!("{collection}\0{id}")
}

/// Key prefix selecting a whole collection.
pub(crate) fn collection_prefix(collection: &str) -> String {
    format!("{collection}\0")
}

/// Evaluate filters against a document.
pub(crate) fn matches(doc: &Value, filters: &[Filter], combine: Combine) -> bool {
    if filters.is_empty() {
        return true;
    }
    let mut check = filters.iter().map(|f| match f.op {
        FilterOp::Eq => doc.get(&f.field) == Some(&f.value),
    });
    match combine {
        Combine::And => check.all(|hit| hit),
        Combine::Or => check.any(|hit| hit),
    }
}

/// Shallow field merge: every top-level field of `patch` overwrites the
/// corresponding field of `target`.
pub(crate) fn merge_fields(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                existing.insert(key, value);
            }
        }
        (target, patch) => *target = patch,
    }
}
