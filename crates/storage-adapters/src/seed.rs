//! JSON seed loader for trails and spots.
//!
//! Trail and spot authoring happens outside the engine; this fills a
//! store from an exported JSON file so the engine has something to
//! serve. Seeding uses `upsert`, so re-running it is harmless.

use std::path::Path;

use anyhow::Context;
use domains::error::StoreError;
use domains::models::{Spot, Trail};
use domains::ports::Store;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub trails: Vec<Trail>,
    #[serde(default)]
    pub spots: Vec<Spot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub trails: usize,
    pub spots: usize,
}

impl SeedData {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("seed file is not valid seed JSON")
    }

    pub async fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading seed file {}", path.display()))?;
        Self::from_json(&raw)
    }

    /// Writes every trail and spot. Spots pointing at a trail that does
    /// not list them are still written, with a warning.
    pub async fn apply(
        self,
        trails: &dyn Store<Trail>,
        spots: &dyn Store<Spot>,
    ) -> Result<SeedSummary, StoreError> {
        let mut summary = SeedSummary::default();

        for spot in &self.spots {
            let listed = self
                .trails
                .iter()
                .any(|t| t.id == spot.trail_id && t.spot_ids.contains(&spot.id));
            if !listed {
                warn!(spot_id = %spot.id, trail_id = %spot.trail_id, "spot is not listed by its trail");
            }
        }

        for trail in self.trails {
            trails.upsert(trail).await?;
            summary.trails += 1;
        }
        for spot in self.spots {
            spots.upsert(spot).await?;
            summary.spots += 1;
        }

        info!(trails = summary.trails, spots = summary.spots, "seed applied");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    const SEED: &str = r#"{
        "trails": [{
            "id": "t1",
            "name": "Old Town",
            "spotIds": ["s1"],
            "options": { "discoveryMode": "sequence", "previewMode": "hidden", "snapRadius": 300 },
            "createdBy": "maker"
        }],
        "spots": [{
            "id": "s1",
            "trailId": "t1",
            "name": "Fountain",
            "description": "Market square",
            "location": { "lat": 51.5, "lon": 7.5 },
            "options": { "discoveryRadius": 50, "clueRadius": 150 },
            "createdBy": "maker"
        }]
    }"#;

    #[test]
    fn test_parse_seed() {
        let seed = SeedData::from_json(SEED).unwrap();
        assert_eq!(seed.trails.len(), 1);
        let trail = &seed.trails[0];
        assert_eq!(trail.options.snap_radius, Some(300.0));
        assert_eq!(trail.options.discovery_mode, domains::models::DiscoveryMode::Sequence);
        assert_eq!(seed.spots[0].options.discovery_radius, 50.0);
    }

    #[test]
    fn test_rejects_malformed_seed() {
        assert!(SeedData::from_json("{ \"trails\": 3 }").is_err());
    }

    #[tokio::test]
    async fn test_apply_is_repeatable() {
        let trails = MemoryStore::<Trail>::new();
        let spots = MemoryStore::<Spot>::new();

        let seed = SeedData::from_json(SEED).unwrap();
        let summary = seed.clone().apply(&trails, &spots).await.unwrap();
        assert_eq!(summary, SeedSummary { trails: 1, spots: 1 });
        seed.apply(&trails, &spots).await.unwrap();

        assert_eq!(trails.len(), 1);
        assert_eq!(spots.len(), 1);
    }
}
