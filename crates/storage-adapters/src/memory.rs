//! In-memory [`Store`] implementation.
//!
//! Rows live in a `DashMap` keyed by entity id, so concurrent writers on
//! different ids never contend and `upsert` is a genuine
//! insert-or-replace. Queries are evaluated against each row's JSON form,
//! the same way a document database would see it.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::error::StoreError;
use domains::ports::{Entity, Query, Store};
use serde_json::Value;
use tracing::trace;

pub struct MemoryStore<T: Entity> {
    rows: DashMap<String, T>,
}

impl<T: Entity> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T: Entity> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shallow merge: top-level fields of `patch` replace those of `target`.
/// A non-object patch replaces the whole document.
fn merge_patch(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(fields), Value::Object(changes)) => {
            for (key, value) in changes {
                fields.insert(key, value);
            }
        }
        (target, patch) => *target = patch,
    }
}

#[async_trait]
impl<T: Entity> Store<T> for MemoryStore<T> {
    async fn create(&self, item: T) -> Result<T, StoreError> {
        match self.rows.entry(item.id().to_string()) {
            Entry::Occupied(entry) => Err(StoreError::Conflict(entry.key().clone())),
            Entry::Vacant(entry) => {
                trace!(collection = T::COLLECTION, id = item.id(), "insert");
                entry.insert(item.clone());
                Ok(item)
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        Ok(self.rows.get(id).map(|row| row.value().clone()))
    }

    /// Matching rows ordered by id, so results are stable across calls.
    async fn list(&self, query: &Query) -> Result<Vec<T>, StoreError> {
        let mut matched = Vec::new();
        for row in self.rows.iter() {
            let document = serde_json::to_value(row.value())?;
            if query.matches(&document) {
                matched.push(row.value().clone());
            }
        }
        matched.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(matched)
    }

    /// The primary key is never rewritten, even if the patch carries an `id`.
    async fn update(&self, id: &str, patch: Value) -> Result<T, StoreError> {
        let mut row = self
            .rows
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut document = serde_json::to_value(row.value())?;
        merge_patch(&mut document, patch);
        if let Value::Object(fields) = &mut document {
            fields.insert("id".to_string(), Value::String(id.to_string()));
        }
        let updated: T = serde_json::from_value(document)?;

        trace!(collection = T::COLLECTION, id, "update");
        *row.value_mut() = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.rows
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn upsert(&self, item: T) -> Result<T, StoreError> {
        trace!(collection = T::COLLECTION, id = item.id(), "upsert");
        self.rows.insert(item.id().to_string(), item.clone());
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::models::DiscoveryProfile;
    use serde_json::json;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn profile(account_id: &str) -> DiscoveryProfile {
        DiscoveryProfile::new(account_id)
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_ids() {
        let store: MemoryStore<DiscoveryProfile> = MemoryStore::new();
        assert_ok!(store.create(profile("a")).await);
        let err = assert_err!(store.create(profile("a")).await);
        assert!(matches!(err, StoreError::Conflict(id) if id == "a"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_by_id() {
        let store: MemoryStore<DiscoveryProfile> = MemoryStore::new();
        for id in ["c", "a", "b"] {
            store.create(profile(id)).await.unwrap();
        }
        store
            .update("b", json!({ "lastActiveTrailId": "t1" }))
            .await
            .unwrap();

        let all = store.list(&Query::new()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let active = store
            .list(&Query::new().eq("lastActiveTrailId", "t1"))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "b");

        let none_active = store
            .list(&Query::new().eq("lastActiveTrailId", Value::Null))
            .await
            .unwrap();
        assert_eq!(none_active.len(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_and_keeps_id() {
        let store: MemoryStore<DiscoveryProfile> = MemoryStore::new();
        store.create(profile("a")).await.unwrap();

        let later = Utc::now();
        let updated = store
            .update(
                "a",
                json!({ "id": "hijack", "lastActiveTrailId": "t9", "updatedAt": later }),
            )
            .await
            .unwrap();
        assert_eq!(updated.id, "a");
        assert_eq!(updated.account_id, "a");
        assert_eq!(updated.last_active_trail_id.as_deref(), Some("t9"));
        assert_eq!(updated.updated_at, later);
        assert!(store.get("hijack").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_rows() {
        let store: MemoryStore<DiscoveryProfile> = MemoryStore::new();
        assert!(matches!(
            store.update("nope", json!({})).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete("nope").await, Err(StoreError::NotFound(_))));

        store.create(profile("a")).await.unwrap();
        assert_ok!(store.delete("a").await);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_bad_patch_is_a_serialization_error() {
        let store: MemoryStore<DiscoveryProfile> = MemoryStore::new();
        let original = store.create(profile("a")).await.unwrap();

        let result = store.update("a", json!({ "createdAt": 42 })).await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
        assert_eq!(store.get("a").await.unwrap(), Some(original));
    }

    #[tokio::test]
    async fn test_concurrent_upserts_leave_one_row() {
        let store = Arc::new(MemoryStore::<DiscoveryProfile>::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.upsert(profile("same")).await }));
        }
        for handle in handles {
            assert_ok!(handle.await.unwrap());
        }
        assert_eq!(store.len(), 1);
    }
}
