//! # Core Traits (Ports)
//!
//! Any storage backend or catalog must implement these traits to be
//! wired into the services.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::models::{Spot, Trail};

/// A record that can live in a `Store<T>`.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection (table) name, used in logs and by document backends
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// A single field condition. Field names are the serialized (camelCase) names.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { field: String, value: Value },
    In { field: String, values: Vec<Value> },
}

/// Conjunction of field filters. An empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn is_in<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filters.push(Filter::In {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Evaluates the query against a serialized document.
    /// Missing fields compare as `null`.
    pub fn matches(&self, document: &Value) -> bool {
        self.filters.iter().all(|filter| match filter {
            Filter::Eq { field, value } => document.get(field).unwrap_or(&Value::Null) == value,
            Filter::In { field, values } => {
                let actual = document.get(field).unwrap_or(&Value::Null);
                values.iter().any(|v| v == actual)
            }
        })
    }
}

/// Generic CRUD persistence contract.
///
/// `create` must fail with [`StoreError::Conflict`] when the id is taken.
/// `update` applies a shallow JSON merge patch to the stored record.
#[async_trait]
pub trait Store<T: Entity>: Send + Sync {
    async fn create(&self, item: T) -> std::result::Result<T, StoreError>;
    async fn get(&self, id: &str) -> std::result::Result<Option<T>, StoreError>;
    async fn list(&self, query: &Query) -> std::result::Result<Vec<T>, StoreError>;
    async fn update(&self, id: &str, patch: Value) -> std::result::Result<T, StoreError>;
    async fn delete(&self, id: &str) -> std::result::Result<(), StoreError>;

    /// Insert or replace by primary key.
    ///
    /// The default is a read-check-write for insert-or-fail backends: a
    /// `Conflict` from a concurrent insert of the same id is a benign race
    /// and resolves to the item as given. Backends with a native upsert
    /// should override this.
    async fn upsert(&self, item: T) -> std::result::Result<T, StoreError> {
        if self.get(item.id()).await?.is_some() {
            let patch = serde_json::to_value(&item)?;
            return self.update(item.id(), patch).await;
        }
        match self.create(item.clone()).await {
            Ok(created) => Ok(created),
            Err(StoreError::Conflict(_)) => Ok(item),
            Err(e) => Err(e),
        }
    }
}

/// Read-only trail contract consumed by the discovery services.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TrailCatalog: Send + Sync {
    async fn get_trail(&self, trail_id: &str) -> Result<Option<Trail>>;
    async fn list_trails(&self) -> Result<Vec<Trail>>;
}

/// Read-only spot contract consumed by the discovery services and composites.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SpotCatalog: Send + Sync {
    async fn get_spot(&self, spot_id: &str) -> Result<Option<Spot>>;
    /// Unknown ids are skipped, not reported.
    async fn get_spots_by_ids(&self, spot_ids: &[String]) -> Result<Vec<Spot>>;
    async fn get_spots_for_trail(&self, trail_id: &str) -> Result<Vec<Spot>>;
}
