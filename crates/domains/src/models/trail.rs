use serde::{Deserialize, Serialize};

use crate::geo::GeoLocation;
use crate::ports::Entity;

/// Which spots are eligible to be discovered next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// Any spot, in any order
    #[default]
    Free,
    /// Only the next undiscovered spot in trail order
    Sequence,
}

/// Whether undiscovered spots emit clues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    #[default]
    Preview,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailOptions {
    #[serde(default)]
    pub discovery_mode: DiscoveryMode,
    #[serde(default)]
    pub preview_mode: PreviewMode,
    /// Range of the external scanner, in meters
    #[serde(default)]
    pub scanner_radius: Option<f64>,
    /// Maximum range of proximity feedback, in meters
    #[serde(default)]
    pub snap_radius: Option<f64>,
}

impl Default for TrailOptions {
    fn default() -> Self {
        Self {
            discovery_mode: DiscoveryMode::Free,
            preview_mode: PreviewMode::Preview,
            scanner_radius: None,
            snap_radius: None,
        }
    }
}

/// Map area a trail is played in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailRegion {
    pub center: GeoLocation,
    pub radius_km: f64,
}

/// An ordered collection of spots. Owns the ordering used by sequence mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trail {
    pub id: String,
    pub name: String,
    pub spot_ids: Vec<String>,
    #[serde(default)]
    pub options: TrailOptions,
    #[serde(default)]
    pub region: Option<TrailRegion>,
    pub created_by: String,
}

impl Entity for Trail {
    const COLLECTION: &'static str = "trails";

    fn id(&self) -> &str {
        &self.id
    }
}
