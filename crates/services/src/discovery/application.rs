//! # Discovery Application
//!
//! Stateful orchestration around the domain service: loads discoveries,
//! trails and spots through injected ports, runs the pure rules and
//! persists the results. Every method takes the caller's
//! [`AccountContext`] and returns a typed `Result`.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use domains::error::{AppError, Result, StoreError};
use domains::geo::{GeoLocation, LocationWithDirection};
use domains::models::{
    AccountContext, Discovery, DiscoveryLocationRecord, DiscoveryProfile, DiscoveryProfilePatch,
    DiscoveryTrail, ScanEvent, Spot, Trail, TrailProgress,
};
use domains::ports::{Query, SpotCatalog, Store, TrailCatalog};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use super::domain;

/// Tunables for the discovery application.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySettings {
    /// Clue filter radius around the user when a trail has no region
    pub default_map_radius_m: f64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            default_map_radius_m: domain::DEFAULT_MAP_RADIUS_METERS,
        }
    }
}

/// Account-facing discovery contract.
pub struct DiscoveryApplication {
    discoveries: Arc<dyn Store<Discovery>>,
    profiles: Arc<dyn Store<DiscoveryProfile>>,
    trails: Arc<dyn TrailCatalog>,
    spots: Arc<dyn SpotCatalog>,
    settings: DiscoverySettings,
}

impl DiscoveryApplication {
    pub fn new(
        discoveries: Arc<dyn Store<Discovery>>,
        profiles: Arc<dyn Store<DiscoveryProfile>>,
        trails: Arc<dyn TrailCatalog>,
        spots: Arc<dyn SpotCatalog>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            discoveries,
            profiles,
            trails,
            spots,
            settings,
        }
    }

    /// Runs one location fix against a trail and persists new discoveries.
    ///
    /// Discoveries are written by upsert on their deterministic id, so two
    /// concurrent fixes qualifying for the same spot leave a single row.
    #[instrument(skip(self, context, location_with_direction), fields(account_id = ?context.account_id))]
    pub async fn process_location(
        &self,
        context: &AccountContext,
        location_with_direction: &LocationWithDirection,
        trail_id: &str,
    ) -> Result<DiscoveryLocationRecord> {
        let account_id = context.require_account_id()?;
        validate_location(&location_with_direction.location)?;

        let discoveries = self.list_account_discoveries(account_id, None).await?;
        let trail = self.require_trail(trail_id).await?;
        let spots = self.spots.get_spots_for_trail(trail_id).await?;

        let record = domain::process_location_update(
            account_id,
            location_with_direction,
            &discoveries,
            &spots,
            &trail,
        );
        self.persist(&record.discoveries).await?;

        debug!(
            new_discoveries = record.discoveries.len(),
            snap = ?record.snap,
            "processed location update"
        );
        Ok(record)
    }

    /// Resolves a scan produced by the sensor subsystem into discoveries.
    /// An unsuccessful or empty scan yields an empty list.
    #[instrument(skip(self, context, scan_event), fields(scan_event_id = %scan_event.id))]
    pub async fn process_scan_event(
        &self,
        context: &AccountContext,
        scan_event: &ScanEvent,
    ) -> Result<Vec<Discovery>> {
        let account_id = context.require_account_id()?;
        if scan_event.account_id != account_id {
            return Err(AppError::Validation(format!(
                "scan event {} belongs to another account",
                scan_event.id
            )));
        }

        let discoveries = self.list_account_discoveries(account_id, None).await?;
        let trail = self.require_trail(&scan_event.trail_id).await?;
        let spots = self.spots.get_spots_for_trail(&trail.id).await?;

        let Some(found) = domain::resolve_scan_event(scan_event, &trail, &discoveries, &spots)
        else {
            debug!("scan event produced nothing to resolve");
            return Ok(Vec::new());
        };
        self.persist(&found).await?;
        Ok(found)
    }

    pub async fn get_discoveries(
        &self,
        context: &AccountContext,
        trail_id: Option<&str>,
    ) -> Result<Vec<Discovery>> {
        let account_id = context.require_account_id()?;
        self.list_account_discoveries(account_id, trail_id).await
    }

    /// Discovered spot ids, oldest discovery first, without duplicates.
    pub async fn get_discovered_spot_ids(
        &self,
        context: &AccountContext,
        trail_id: Option<&str>,
    ) -> Result<Vec<String>> {
        let discoveries = self.get_discoveries(context, trail_id).await?;
        let mut seen = HashSet::new();
        Ok(discoveries
            .into_iter()
            .filter(|d| seen.insert(d.spot_id.clone()))
            .map(|d| d.spot_id)
            .collect())
    }

    pub async fn get_discovered_spots(
        &self,
        context: &AccountContext,
        trail_id: Option<&str>,
    ) -> Result<Vec<Spot>> {
        let spot_ids = self.get_discovered_spot_ids(context, trail_id).await?;
        if spot_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.spots.get_spots_by_ids(&spot_ids).await
    }

    pub async fn is_spot_discovered(&self, context: &AccountContext, spot_id: &str) -> Result<bool> {
        let account_id = context.require_account_id()?;
        let query = Query::new()
            .eq("accountId", account_id)
            .eq("spotId", spot_id);
        Ok(!self.discoveries.list(&query).await?.is_empty())
    }

    #[instrument(skip(self, context), fields(account_id = ?context.account_id))]
    pub async fn get_discovery_trail(
        &self,
        context: &AccountContext,
        trail_id: &str,
        user_location: Option<GeoLocation>,
    ) -> Result<DiscoveryTrail> {
        let account_id = context.require_account_id()?;
        let trail = self.require_trail(trail_id).await?;
        let spots = self.spots.get_spots_for_trail(trail_id).await?;
        let discoveries = self.list_account_discoveries(account_id, None).await?;

        Ok(domain::build_discovery_trail(
            account_id,
            &trail,
            &discoveries,
            &spots,
            user_location.as_ref(),
            self.settings.default_map_radius_m,
        ))
    }

    pub async fn get_trail_progress(
        &self,
        context: &AccountContext,
        trail_id: &str,
    ) -> Result<TrailProgress> {
        let account_id = context.require_account_id()?;
        let trail = self.require_trail(trail_id).await?;
        let discoveries = self.list_account_discoveries(account_id, None).await?;
        Ok(domain::trail_progress(account_id, &trail, &discoveries))
    }

    /// The account's profile, created on first access.
    pub async fn get_discovery_profile(&self, context: &AccountContext) -> Result<DiscoveryProfile> {
        let account_id = context.require_account_id()?;
        if let Some(profile) = self.profiles.get(account_id).await? {
            return Ok(profile);
        }

        match self.profiles.create(DiscoveryProfile::new(account_id)).await {
            Ok(profile) => {
                debug!(account_id, "created discovery profile");
                Ok(profile)
            }
            // A concurrent first access won the insert; read its row.
            Err(StoreError::Conflict(_)) => self
                .profiles
                .get(account_id)
                .await?
                .ok_or_else(|| AppError::not_found("discovery profile", account_id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_discovery_profile(
        &self,
        context: &AccountContext,
        patch: DiscoveryProfilePatch,
    ) -> Result<DiscoveryProfile> {
        let profile = self.get_discovery_profile(context).await?;

        let mut changes = serde_json::to_value(&patch).map_err(StoreError::from)?;
        if let Value::Object(fields) = &mut changes {
            fields.insert("updatedAt".to_string(), json!(Utc::now()));
        }
        Ok(self.profiles.update(&profile.id, changes).await?)
    }

    async fn list_account_discoveries(
        &self,
        account_id: &str,
        trail_id: Option<&str>,
    ) -> Result<Vec<Discovery>> {
        let mut query = Query::new().eq("accountId", account_id);
        if let Some(trail_id) = trail_id {
            query = query.eq("trailId", trail_id);
        }
        let mut discoveries = self.discoveries.list(&query).await?;
        discoveries.sort_by(|a, b| {
            a.discovered_at
                .cmp(&b.discovered_at)
                .then_with(|| a.spot_id.cmp(&b.spot_id))
        });
        Ok(discoveries)
    }

    async fn require_trail(&self, trail_id: &str) -> Result<Trail> {
        self.trails
            .get_trail(trail_id)
            .await?
            .ok_or_else(|| AppError::not_found("trail", trail_id))
    }

    async fn persist(&self, discoveries: &[Discovery]) -> Result<()> {
        for discovery in discoveries {
            self.discoveries.upsert(discovery.clone()).await?;
            info!(
                account_id = %discovery.account_id,
                spot_id = %discovery.spot_id,
                scan_event_id = ?discovery.scan_event_id,
                "spot discovered"
            );
        }
        Ok(())
    }
}

fn validate_location(location: &GeoLocation) -> Result<()> {
    if location.is_valid() {
        Ok(())
    } else {
        warn!(lat = location.lat, lon = location.lon, "rejected out-of-range location");
        Err(AppError::Validation(format!(
            "location ({}, {}) is outside WGS84 bounds",
            location.lat, location.lon
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{abc_trail, Harness};
    use domains::models::{ClueSource, DiscoveryMode};
    use domains::ports::{MockSpotCatalog, MockTrailCatalog};
    use storage_adapters::MemoryStore;

    fn fix(lat: f64, lon: f64) -> LocationWithDirection {
        LocationWithDirection::at(GeoLocation::new(lat, lon))
    }

    async fn free_harness() -> Harness {
        let (trail, spots) = abc_trail(DiscoveryMode::Free);
        Harness::seeded(vec![trail], spots).await
    }

    #[tokio::test]
    async fn test_repeated_location_keeps_one_row() {
        let h = free_harness().await;
        let ctx = AccountContext::user("acc-1");

        let first = h.discovery.process_location(&ctx, &fix(51.5, 7.5), "t1").await.unwrap();
        assert_eq!(first.discoveries.len(), 1);
        assert_eq!(first.discoveries[0].spot_id, "A");

        let second = h.discovery.process_location(&ctx, &fix(51.5, 7.5), "t1").await.unwrap();
        assert!(second.discoveries.is_empty());
        assert_eq!(h.discoveries.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_locations_share_one_discovery() {
        let h = free_harness().await;
        let ctx = AccountContext::user("acc-1");
        let here = fix(51.5, 7.5);

        let (a, b) = tokio::join!(
            h.discovery.process_location(&ctx, &here, "t1"),
            h.discovery.process_location(&ctx, &here, "t1"),
        );
        let ids: Vec<String> = a
            .unwrap()
            .discoveries
            .into_iter()
            .chain(b.unwrap().discoveries)
            .map(|d| d.id)
            .collect();
        assert!(ids.iter().all(|id| id == &ids[0]));
        assert_eq!(h.discoveries.len(), 1);
    }

    #[tokio::test]
    async fn test_process_location_errors() {
        let h = free_harness().await;

        let anonymous = AccountContext {
            account_id: None,
            ..AccountContext::user("x")
        };
        let err = h.discovery.process_location(&anonymous, &fix(51.5, 7.5), "t1").await.unwrap_err();
        assert_eq!(err.code(), "ACCOUNT_ID_REQUIRED");

        let ctx = AccountContext::user("acc-1");
        let err = h.discovery.process_location(&ctx, &fix(51.5, 7.5), "missing").await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        let err = h.discovery.process_location(&ctx, &fix(95.0, 7.5), "t1").await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(h.discoveries.is_empty());
    }

    #[tokio::test]
    async fn test_scan_event_is_persisted_with_its_id() {
        let h = free_harness().await;
        let ctx = AccountContext::user("acc-1");
        let scan = ScanEvent {
            id: "scan-7".into(),
            account_id: "acc-1".into(),
            trail_id: "t1".into(),
            successful: true,
            clues: ["B", "C"]
                .iter()
                .map(|id| domains::models::Clue {
                    id: format!("c-{id}"),
                    spot_id: id.to_string(),
                    trail_id: "t1".into(),
                    location: GeoLocation::new(0.0, 0.0),
                    radius: 5.0,
                    source: ClueSource::ScanEvent,
                })
                .collect(),
            created_at: Utc::now(),
        };

        let found = h.discovery.process_scan_event(&ctx, &scan).await.unwrap();
        assert_eq!(found.len(), 2);
        let stored = h.discovery.get_discoveries(&ctx, Some("t1")).await.unwrap();
        assert!(stored.iter().all(|d| d.scan_event_id.as_deref() == Some("scan-7")));

        let other = AccountContext::user("acc-2");
        let err = h.discovery.process_scan_event(&other, &scan).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let failed = ScanEvent {
            successful: false,
            ..scan
        };
        assert!(h.discovery.process_scan_event(&ctx, &failed).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discovered_reads() {
        let h = free_harness().await;
        let ctx = AccountContext::user("acc-1");
        assert!(h.discovery.get_discovered_spots(&ctx, None).await.unwrap().is_empty());

        h.discovery.process_location(&ctx, &fix(51.502, 7.5), "t1").await.unwrap();
        h.discovery.process_location(&ctx, &fix(51.5, 7.5), "t1").await.unwrap();

        let ids = h.discovery.get_discovered_spot_ids(&ctx, Some("t1")).await.unwrap();
        assert_eq!(ids, vec!["C".to_string(), "A".to_string()]);
        let spots = h.discovery.get_discovered_spots(&ctx, None).await.unwrap();
        assert_eq!(spots.len(), 2);
        assert_eq!(spots[0].id, "C");
        assert!(h.discovery.is_spot_discovered(&ctx, "A").await.unwrap());
        assert!(!h.discovery.is_spot_discovered(&ctx, "B").await.unwrap());
        assert!(h.discovery.get_discoveries(&ctx, Some("other")).await.unwrap().is_empty());

        let progress = h.discovery.get_trail_progress(&ctx, "t1").await.unwrap();
        assert_eq!(progress.discovered, 2);
        assert_eq!(progress.percentage, 67);
        assert!(!progress.completed);
    }

    #[tokio::test]
    async fn test_discovery_trail_filters_clues_around_user() {
        let (trail, mut spots) = abc_trail(DiscoveryMode::Free);
        let mut trail = trail;
        spots.push(crate::fixtures::spot("D", "t1", 52.5, 7.5));
        trail.spot_ids.push("D".into());
        let h = Harness::seeded(vec![trail], spots).await;
        let ctx = AccountContext::user("acc-1");

        let all = h.discovery.get_discovery_trail(&ctx, "t1", None).await.unwrap();
        assert_eq!(all.preview_clues.len(), 4);

        let near = h
            .discovery
            .get_discovery_trail(&ctx, "t1", Some(GeoLocation::new(51.5, 7.5)))
            .await
            .unwrap();
        assert_eq!(near.preview_clues.len(), 3);
        assert!(near.spots.is_empty());
    }

    #[tokio::test]
    async fn test_profile_created_once_and_patched() {
        let h = free_harness().await;
        let ctx = AccountContext::user("acc-1");

        let profile = h.discovery.get_discovery_profile(&ctx).await.unwrap();
        assert_eq!(profile.id, "acc-1");
        assert_eq!(profile.last_active_trail_id, None);
        h.discovery.get_discovery_profile(&ctx).await.unwrap();
        assert_eq!(h.profiles.len(), 1);

        let updated = h
            .discovery
            .update_discovery_profile(&ctx, DiscoveryProfilePatch::activate("t1"))
            .await
            .unwrap();
        assert_eq!(updated.last_active_trail_id.as_deref(), Some("t1"));
        assert!(updated.updated_at >= profile.updated_at);

        let unchanged = h
            .discovery
            .update_discovery_profile(&ctx, DiscoveryProfilePatch::default())
            .await
            .unwrap();
        assert_eq!(unchanged.last_active_trail_id.as_deref(), Some("t1"));

        let cleared = h
            .discovery
            .update_discovery_profile(&ctx, DiscoveryProfilePatch::deactivate())
            .await
            .unwrap();
        assert_eq!(cleared.last_active_trail_id, None);
    }

    /// Profile store where another writer always wins the first insert.
    struct RacingProfiles {
        rows: MemoryStore<DiscoveryProfile>,
    }

    #[async_trait::async_trait]
    impl Store<DiscoveryProfile> for RacingProfiles {
        async fn create(&self, item: DiscoveryProfile) -> std::result::Result<DiscoveryProfile, StoreError> {
            let mut winner = DiscoveryProfile::new(&item.account_id);
            winner.last_active_trail_id = Some("set-by-winner".into());
            self.rows.upsert(winner).await?;
            Err(StoreError::Conflict(item.id))
        }

        async fn get(&self, id: &str) -> std::result::Result<Option<DiscoveryProfile>, StoreError> {
            self.rows.get(id).await
        }

        async fn list(&self, query: &Query) -> std::result::Result<Vec<DiscoveryProfile>, StoreError> {
            self.rows.list(query).await
        }

        async fn update(&self, id: &str, patch: Value) -> std::result::Result<DiscoveryProfile, StoreError> {
            self.rows.update(id, patch).await
        }

        async fn delete(&self, id: &str) -> std::result::Result<(), StoreError> {
            self.rows.delete(id).await
        }
    }

    #[tokio::test]
    async fn test_profile_creation_race_reads_the_winning_row() {
        let (trail, spots) = abc_trail(DiscoveryMode::Free);
        let h = Harness::seeded(vec![trail], spots).await;
        let profiles = Arc::new(RacingProfiles {
            rows: MemoryStore::new(),
        });
        let app = DiscoveryApplication::new(
            h.discoveries.clone(),
            profiles.clone(),
            h.trail_catalog.clone(),
            h.spot_catalog.clone(),
            DiscoverySettings::default(),
        );

        let profile = app
            .get_discovery_profile(&AccountContext::user("acc-1"))
            .await
            .unwrap();
        assert_eq!(profile.id, "acc-1");
        assert_eq!(profile.last_active_trail_id.as_deref(), Some("set-by-winner"));
        assert_eq!(profiles.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_sequence_scan_skips_trail_entries_without_spots() {
        use crate::fixtures::{spot, trail};

        let t = trail("t1", DiscoveryMode::Sequence, &["X", "A", "B"]);
        let spots = vec![spot("A", "t1", 51.500, 7.5), spot("B", "t1", 51.501, 7.5)];
        let h = Harness::seeded(vec![t], spots).await;
        let ctx = AccountContext::user("acc-1");

        let mut scan = ScanEvent {
            id: "scan-1".into(),
            account_id: "acc-1".into(),
            trail_id: "t1".into(),
            successful: true,
            clues: vec![domains::models::Clue {
                id: "clue-a".into(),
                spot_id: "A".into(),
                trail_id: "t1".into(),
                location: GeoLocation::new(51.500, 7.5),
                radius: 150.0,
                source: ClueSource::ScanEvent,
            }],
            created_at: Utc::now(),
        };
        let found = h.discovery.process_scan_event(&ctx, &scan).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].spot_id, "A");

        scan.id = "scan-2".into();
        scan.clues[0].spot_id = "B".into();
        let found = h.discovery.process_scan_event(&ctx, &scan).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].spot_id, "B");
        assert_eq!(h.discoveries.len(), 2);
    }

    #[tokio::test]
    async fn test_catalog_failures_surface_as_store_errors() {
        let mut trails = MockTrailCatalog::new();
        trails
            .expect_get_trail()
            .returning(|_| Err(StoreError::Backend("catalog offline".into()).into()));
        let mut spots = MockSpotCatalog::new();
        spots.expect_get_spots_for_trail().never();

        let app = DiscoveryApplication::new(
            Arc::new(MemoryStore::<Discovery>::new()),
            Arc::new(MemoryStore::<DiscoveryProfile>::new()),
            Arc::new(trails),
            Arc::new(spots),
            DiscoverySettings::default(),
        );
        let err = app
            .process_location(&AccountContext::user("acc-1"), &fix(51.5, 7.5), "t1")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "STORE_ERROR");
        assert!(err.is_retryable());
    }
}
