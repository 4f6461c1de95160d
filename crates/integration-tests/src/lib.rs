//! Shared wiring for the end-to-end tests: the whole engine over
//! in-memory stores, plus small builders for trails and spots.

use std::sync::Arc;

use domains::geo::{GeoLocation, LocationWithDirection};
use domains::models::{
    Discovery, DiscoveryMode, DiscoveryProfile, Spot, SpotOptions, SpotVisibility, Trail,
    TrailOptions,
};
use domains::error::StoreError;
use domains::ports::SpotCatalog;
use services::{
    DiscoveryApplication, DiscoverySettings, DiscoveryStateComposite, SpotAccessComposite,
    StoreSpotCatalog, StoreTrailCatalog,
};
use storage_adapters::{MemoryStore, SeedData};

pub const CREATOR: &str = "maker";

pub fn spot(id: &str, trail_id: &str, lat: f64, lon: f64, discovery_radius: f64) -> Spot {
    Spot {
        id: id.into(),
        trail_id: trail_id.into(),
        name: format!("Spot {id}"),
        description: format!("What you find at {id}"),
        location: GeoLocation::new(lat, lon),
        options: SpotOptions {
            discovery_radius,
            clue_radius: 150.0,
            visibility: SpotVisibility::Public,
        },
        created_by: CREATOR.into(),
    }
}

pub fn trail(id: &str, mode: DiscoveryMode, spots: &[&Spot]) -> Trail {
    Trail {
        id: id.into(),
        name: format!("Trail {id}"),
        spot_ids: spots.iter().map(|s| s.id.clone()).collect(),
        options: TrailOptions {
            discovery_mode: mode,
            ..TrailOptions::default()
        },
        region: None,
        created_by: CREATOR.into(),
    }
}

pub fn fix(lat: f64, lon: f64) -> LocationWithDirection {
    LocationWithDirection::at(GeoLocation::new(lat, lon))
}

pub struct World {
    pub discoveries: Arc<MemoryStore<Discovery>>,
    pub profiles: Arc<MemoryStore<DiscoveryProfile>>,
    pub trail_catalog: Arc<StoreTrailCatalog>,
    pub spot_catalog: Arc<StoreSpotCatalog>,
    pub discovery: Arc<DiscoveryApplication>,
    pub access: SpotAccessComposite,
    pub state: DiscoveryStateComposite,
}

impl World {
    pub async fn new(trails: Vec<Trail>, spots: Vec<Spot>) -> Result<Self, StoreError> {
        let trail_store = Arc::new(MemoryStore::<Trail>::new());
        let spot_store = Arc::new(MemoryStore::<Spot>::new());
        SeedData { trails, spots }
            .apply(trail_store.as_ref(), spot_store.as_ref())
            .await?;

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

        Ok(Self {
            access: SpotAccessComposite::new(
                discovery.clone(),
                spot_catalog.clone(),
                trail_catalog.clone(),
            ),
            state: DiscoveryStateComposite::new(discovery.clone(), trail_catalog.clone()),
            discoveries,
            profiles,
            trail_catalog,
            spot_catalog,
            discovery,
        })
    }

    /// Access composite reading spots through a different catalog, e.g. a mock.
    pub fn access_with(&self, spots: Arc<dyn SpotCatalog>) -> SpotAccessComposite {
        SpotAccessComposite::new(self.discovery.clone(), spots, self.trail_catalog.clone())
    }
}
