//! In-memory document store for tests.
//!
//! Same key scheme and semantics as the disk backend. Also supports fault
//! injection so storage-failure paths can be exercised.

use super::{
    Combine, DocumentStore, Filter, StoreError, collection_prefix, doc_key, matches, merge_fields,
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// In-process persistence gateway.
#[derive(Default)]
pub struct MemoryStore {
    docs: DashMap<String, Value>,
    fail: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a storage error.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StoreError::Backend("injected failure".to_string()))
        } else {
            Ok(())
        }
    }

    /// Insert a document verbatim, bypassing id assignment. Test seam for
    /// constructing divergent states.
    pub fn put_raw(&self, collection: &str, id: &str, doc: Value) {
        self.docs.insert(doc_key(collection, id), doc);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, mut doc: Value) -> Result<String, StoreError> {
        self.check()?;
        let id = Uuid::new_v4().to_string();
        if let Value::Object(fields) = &mut doc {
            fields.insert("id".to_string(), Value::String(id.clone()));
        }
        self.docs.insert(doc_key(collection, &id), doc);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.check()?;
        Ok(self.docs.get(&doc_key(collection, id)).map(|doc| doc.clone()))
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        merge: bool,
    ) -> Result<(), StoreError> {
        self.check()?;
        let key = doc_key(collection, id);
        if merge {
            let mut entry = self
                .docs
                .entry(key)
                .or_insert_with(|| Value::Object(Default::default()));
            merge_fields(entry.value_mut(), doc);
        } else {
            self.docs.insert(key, doc);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check()?;
        self.docs.remove(&doc_key(collection, id));
        Ok(())
    }

    async fn find(
        &self,
        collection: &str,
        filters: &[Filter],
        combine: Combine,
    ) -> Result<Vec<Value>, StoreError> {
        self.check()?;
        let prefix = collection_prefix(collection);
        Ok(self
            .docs
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .filter(|entry| matches(entry.value(), filters, combine))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete_where(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<(), StoreError> {
        self.check()?;
        let prefix = collection_prefix(collection);
        self.docs.retain(|key, doc| {
            !(key.starts_with(&prefix) && matches(doc, filters, Combine::And))
        });
        Ok(())
    }
}
