//! Shared builders for unit tests.

use std::sync::Arc;

use domains::geo::GeoLocation;
use domains::models::{
    Discovery, DiscoveryMode, DiscoveryProfile, Spot, SpotOptions, SpotVisibility, Trail,
    TrailOptions,
};
use domains::ports::Store;
use storage_adapters::MemoryStore;

use crate::catalog::{StoreSpotCatalog, StoreTrailCatalog};
use crate::discovery::{DiscoveryApplication, DiscoverySettings};

pub const CREATOR: &str = "maker";

pub fn spot(id: &str, trail_id: &str, lat: f64, lon: f64) -> Spot {
    Spot {
        id: id.into(),
        trail_id: trail_id.into(),
        name: format!("Spot {id}"),
        description: format!("Hidden detail of {id}"),
        location: GeoLocation::new(lat, lon),
        options: SpotOptions {
            discovery_radius: 50.0,
            clue_radius: 150.0,
            visibility: SpotVisibility::Public,
        },
        created_by: CREATOR.into(),
    }
}

pub fn trail(id: &str, mode: DiscoveryMode, spot_ids: &[&str]) -> Trail {
    Trail {
        id: id.into(),
        name: format!("Trail {id}"),
        spot_ids: spot_ids.iter().map(|s| s.to_string()).collect(),
        options: TrailOptions {
            discovery_mode: mode,
            ..TrailOptions::default()
        },
        region: None,
        created_by: CREATOR.into(),
    }
}

/// Trail `t1` with spots A, B, C roughly 111 m apart going north.
pub fn abc_trail(mode: DiscoveryMode) -> (Trail, Vec<Spot>) {
    let spots = vec![
        spot("A", "t1", 51.500, 7.500),
        spot("B", "t1", 51.501, 7.500),
        spot("C", "t1", 51.502, 7.500),
    ];
    (trail("t1", mode, &["A", "B", "C"]), spots)
}

/// In-memory wiring of the discovery application.
pub struct Harness {
    pub discoveries: Arc<MemoryStore<Discovery>>,
    pub profiles: Arc<MemoryStore<DiscoveryProfile>>,
    pub trail_catalog: Arc<StoreTrailCatalog>,
    pub spot_catalog: Arc<StoreSpotCatalog>,
    pub discovery: Arc<DiscoveryApplication>,
}

impl Harness {
    pub async fn seeded(trails: Vec<Trail>, spots: Vec<Spot>) -> Self {
        let trail_store = Arc::new(MemoryStore::<Trail>::new());
        let spot_store = Arc::new(MemoryStore::<Spot>::new());
        for t in trails {
            trail_store.upsert(t).await.unwrap();
        }
        for s in spots {
            spot_store.upsert(s).await.unwrap();
        }

        let discoveries = Arc::new(MemoryStore::<Discovery>::new());
        let profiles = Arc::new(MemoryStore::<DiscoveryProfile>::new());
        let trail_catalog = Arc::new(StoreTrailCatalog::new(trail_store));
        let spot_catalog = Arc::new(StoreSpotCatalog::new(spot_store));
        let discovery = Arc::new(DiscoveryApplication::new(
            discoveries.clone(),
            profiles.clone(),
            trail_catalog.clone(),
            spot_catalog.clone(),
            DiscoverySettings::default(),
        ));

        Self {
            discoveries,
            profiles,
            trail_catalog,
            spot_catalog,
            discovery,
        }
    }
}
