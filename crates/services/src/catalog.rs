//! Store-backed read models for trails and spots.
//!
//! Trail and spot management lives outside this engine; these adapters
//! expose the read-only [`TrailCatalog`] / [`SpotCatalog`] contracts over
//! the same `Store<T>` the management side writes to.

use std::sync::Arc;

use async_trait::async_trait;
use domains::error::Result;
use domains::models::{Spot, Trail};
use domains::ports::{Query, SpotCatalog, Store, TrailCatalog};
use tracing::debug;

pub struct StoreTrailCatalog {
    trails: Arc<dyn Store<Trail>>,
}

impl StoreTrailCatalog {
    pub fn new(trails: Arc<dyn Store<Trail>>) -> Self {
        Self { trails }
    }
}

#[async_trait]
impl TrailCatalog for StoreTrailCatalog {
    async fn get_trail(&self, trail_id: &str) -> Result<Option<Trail>> {
        Ok(self.trails.get(trail_id).await?)
    }

    async fn list_trails(&self) -> Result<Vec<Trail>> {
        Ok(self.trails.list(&Query::new()).await?)
    }
}

pub struct StoreSpotCatalog {
    spots: Arc<dyn Store<Spot>>,
}

impl StoreSpotCatalog {
    pub fn new(spots: Arc<dyn Store<Spot>>) -> Self {
        Self { spots }
    }
}

#[async_trait]
impl SpotCatalog for StoreSpotCatalog {
    async fn get_spot(&self, spot_id: &str) -> Result<Option<Spot>> {
        Ok(self.spots.get(spot_id).await?)
    }

    /// Returned in the order of `spot_ids`.
    async fn get_spots_by_ids(&self, spot_ids: &[String]) -> Result<Vec<Spot>> {
        if spot_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new().is_in("id", spot_ids.iter().cloned());
        let mut spots = self.spots.list(&query).await?;
        spots.sort_by_key(|spot| spot_ids.iter().position(|id| id == &spot.id));
        debug!(requested = spot_ids.len(), found = spots.len(), "loaded spots by id");
        Ok(spots)
    }

    async fn get_spots_for_trail(&self, trail_id: &str) -> Result<Vec<Spot>> {
        Ok(self.spots.list(&Query::new().eq("trailId", trail_id)).await?)
    }
}
