//! Redb-backed document store.
//!
//! One table holds every collection; keys are `collection\0id` and values are
//! serde_json bytes. Queries scan the collection's key prefix and evaluate
//! predicates in process.

use super::{
    Combine, DocumentStore, Filter, StoreError, collection_prefix, doc_key, matches, merge_fields,
};
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");

fn backend(err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Redb-backed persistence gateway.
pub struct DiskStore {
    db: Arc<Database>,
}

impl DiskStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(path = %parent.display(), error = %e, "Failed to create store directory");
        }

        let db = Database::create(path).map_err(backend)?;

        // Ensure the table exists before the first read
        let write_txn = db.begin_write().map_err(backend)?;
        {
            let _ = write_txn.open_table(DOCUMENTS).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;

        info!(path = %path.display(), "Document store opened");
        Ok(Self { db: Arc::new(db) })
    }

    fn read_doc(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table = read_txn.open_table(DOCUMENTS).map_err(backend)?;
        let Some(raw) = table.get(key).map_err(backend)? else {
            return Ok(None);
        };
        let doc = serde_json::from_slice(raw.value())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Some(doc))
    }

    fn write_doc(&self, key: &str, doc: &Value) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec(doc).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = write_txn.open_table(DOCUMENTS).map_err(backend)?;
            table.insert(key, bytes.as_slice()).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)
    }

    /// Collect `(key, doc)` pairs for a whole collection.
    ///
    /// Documents that fail to decode are skipped with a warning rather than
    /// failing the query.
    fn scan(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let prefix = collection_prefix(collection);
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table = read_txn.open_table(DOCUMENTS).map_err(backend)?;

        let mut docs = Vec::new();
        for item in table.iter().map_err(backend)? {
            let (key, value) = item.map_err(backend)?;
            if !key.value().starts_with(&prefix) {
                continue;
            }
            match serde_json::from_slice::<Value>(value.value()) {
                Ok(doc) => docs.push((key.value().to_string(), doc)),
                Err(e) => {
                    warn!(key = %key.value(), error = %e, "Skipping undecodable document");
                }
            }
        }
        Ok(docs)
    }

    fn remove_keys(&self, keys: &[String]) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = write_txn.open_table(DOCUMENTS).map_err(backend)?;
            for key in keys {
                table.remove(key.as_str()).map_err(backend)?;
            }
        }
        write_txn.commit().map_err(backend)
    }
}

#[async_trait]
impl DocumentStore for DiskStore {
    async fn create(&self, collection: &str, mut doc: Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        if let Value::Object(fields) = &mut doc {
            fields.insert("id".to_string(), Value::String(id.clone()));
        }
        self.write_doc(&doc_key(collection, &id), &doc)?;
        debug!(collection, id = %id, "Document created");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.read_doc(&doc_key(collection, id))
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        merge: bool,
    ) -> Result<(), StoreError> {
        let key = doc_key(collection, id);
        if merge {
            let mut existing = self.read_doc(&key)?.unwrap_or_else(|| Value::Object(Default::default()));
            merge_fields(&mut existing, doc);
            self.write_doc(&key, &existing)
        } else {
            self.write_doc(&key, &doc)
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.remove_keys(&[doc_key(collection, id)])
    }

    async fn find(
        &self,
        collection: &str,
        filters: &[Filter],
        combine: Combine,
    ) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .scan(collection)?
            .into_iter()
            .filter(|(_, doc)| matches(doc, filters, combine))
            .map(|(_, doc)| doc)
            .collect())
    }

    async fn delete_where(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<(), StoreError> {
        // Collect first; mutating while iterating is not allowed.
        let keys: Vec<String> = self
            .scan(collection)?
            .into_iter()
            .filter(|(_, doc)| matches(doc, filters, Combine::And))
            .map(|(key, _)| key)
            .collect();
        self.remove_keys(&keys)
    }
}
