//! In-memory document store double
//!
//! Used by the panel workflow tests. Tracks per-operation call counts
//! and supports failure injection so tests can assert that validation
//! failures never reach the store and that delete failures leave
//! records in place.

use super::{Direction, DocumentStore, OrderBy, RawDocument, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Injected {
    list: Option<StoreError>,
    create: Option<StoreError>,
    update: Option<StoreError>,
    delete: Option<StoreError>,
}

/// In-memory double for the document store contract
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<RawDocument>>>,
    seq: AtomicU64,
    ordering_supported: AtomicBool,
    injected: Mutex<Injected>,
    list_calls: AtomicU64,
    create_calls: AtomicU64,
    update_calls: AtomicU64,
    delete_calls: AtomicU64,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        let store = Self::default();
        store.ordering_supported.store(true, Ordering::SeqCst);
        store
    }

    /// Make every ordered list request fail with `PreconditionFailed`,
    /// as a store without the needed index would.
    pub fn deny_ordering(&self) {
        self.ordering_supported.store(false, Ordering::SeqCst);
    }

    pub fn fail_next_list(&self, err: StoreError) {
        self.injected.lock().unwrap().list = Some(err);
    }

    pub fn fail_next_create(&self, err: StoreError) {
        self.injected.lock().unwrap().create = Some(err);
    }

    pub fn fail_next_update(&self, err: StoreError) {
        self.injected.lock().unwrap().update = Some(err);
    }

    pub fn fail_next_delete(&self, err: StoreError) {
        self.injected.lock().unwrap().delete = Some(err);
    }

    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> u64 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> u64 {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Seed a document directly, bypassing counters. Returns the id.
    pub fn seed(&self, collection: &str, fields: serde_json::Value) -> String {
        self.seed_at(collection, fields, Some(Utc::now()))
    }

    /// Seed a document with an explicit (possibly absent) timestamp.
    pub fn seed_at(
        &self,
        collection: &str,
        fields: serde_json::Value,
        created_at: Option<chrono::DateTime<Utc>>,
    ) -> String {
        let id = self.next_id();
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(RawDocument {
                id: id.clone(),
                fields,
                created_at,
            });
        id
    }

    fn next_id(&self) -> String {
        format!("doc-{}", self.seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn take_injected(slot: &mut Option<StoreError>) -> Result<(), StoreError> {
        match slot.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(
        &self,
        collection: &str,
        order: Option<OrderBy>,
    ) -> Result<Vec<RawDocument>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Self::take_injected(&mut self.injected.lock().unwrap().list)?;

        if order.is_some() && !self.ordering_supported.load(Ordering::SeqCst) {
            return Err(StoreError::PreconditionFailed {
                message: "ordering requested on an unindexed field".to_string(),
            });
        }

        let mut docs = self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default();

        if let Some(order) = order {
            docs.sort_by(|a, b| match order.direction {
                Direction::Ascending => a.created_at.cmp(&b.created_at),
                // Timestamp-less documents sort last, matching the
                // client-side fallback ordering.
                Direction::Descending => match (a.created_at, b.created_at) {
                    (Some(a), Some(b)) => b.cmp(&a),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                },
            });
        }

        Ok(docs)
    }

    async fn create(
        &self,
        collection: &str,
        fields: serde_json::Value,
    ) -> Result<String, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Self::take_injected(&mut self.injected.lock().unwrap().create)?;
        Ok(self.seed(collection, fields))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: serde_json::Value,
    ) -> Result<(), StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Self::take_injected(&mut self.injected.lock().unwrap().update)?;

        let mut collections = self.collections.lock().unwrap();
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::Unavailable {
                message: format!("unknown collection {}", collection),
            })?;

        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::Unavailable {
                message: format!("document {} not found", id),
            })?;

        if let (Some(existing), Some(patch)) = (doc.fields.as_object_mut(), fields.as_object()) {
            for (key, value) in patch {
                existing.insert(key.clone(), value.clone());
            }
        }

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Self::take_injected(&mut self.injected.lock().unwrap().delete)?;

        let mut collections = self.collections.lock().unwrap();
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|d| d.id != id);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let store = MemoryDocumentStore::new();
        let a = store.create("gallery", json!({"heading": "a"})).await.unwrap();
        let b = store.create("gallery", json!({"heading": "b"})).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_deny_ordering_rejects_ordered_queries() {
        let store = MemoryDocumentStore::new();
        store.deny_ordering();

        let err = store
            .list("gallery", Some(OrderBy::newest_first()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PreconditionFailed { .. }));

        // Unordered fetch still works
        assert!(store.list("gallery", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_descending_order_puts_timestamp_less_documents_last() {
        let store = MemoryDocumentStore::new();
        let old = Utc::now() - chrono::Duration::days(1);

        let untimed = store.seed_at("gallery", json!({"heading": "a"}), None);
        let oldest = store.seed_at("gallery", json!({"heading": "b"}), Some(old));
        let newest = store.seed_at("gallery", json!({"heading": "c"}), Some(Utc::now()));

        let docs = store
            .list("gallery", Some(OrderBy::newest_first()))
            .await
            .unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec![newest.as_str(), oldest.as_str(), untimed.as_str()]);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryDocumentStore::new();
        let id = store.seed("council", json!({"name": "A", "status": "current"}));

        store
            .update("council", &id, json!({"status": "past"}))
            .await
            .unwrap();

        let docs = store.list("council", None).await.unwrap();
        assert_eq!(docs[0].fields["name"], "A");
        assert_eq!(docs[0].fields["status"], "past");
    }

    #[tokio::test]
    async fn test_injected_delete_failure_is_one_shot() {
        let store = MemoryDocumentStore::new();
        let id = store.seed("member", json!({"name": "A"}));

        store.fail_next_delete(StoreError::Unavailable {
            message: "down".into(),
        });
        assert!(store.delete("member", &id).await.is_err());
        assert!(store.delete("member", &id).await.is_ok());
    }
}
