use serde::{Deserialize, Serialize};

use crate::geo::GeoLocation;
use crate::ports::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotVisibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotOptions {
    /// Distance in meters at which an account discovers the spot
    pub discovery_radius: f64,
    /// Radius in meters drawn around the spot's clue
    pub clue_radius: f64,
    #[serde(default)]
    pub visibility: SpotVisibility,
}

/// The full spot record. Only visible to discoverers, its creator and
/// admins working in the authoring tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    pub id: String,
    pub trail_id: String,
    pub name: String,
    pub description: String,
    pub location: GeoLocation,
    pub options: SpotOptions,
    pub created_by: String,
}

impl Spot {
    pub fn preview(&self) -> SpotPreview {
        SpotPreview {
            id: self.id.clone(),
            trail_id: self.trail_id.clone(),
        }
    }
}

impl Entity for Spot {
    const COLLECTION: &'static str = "spots";

    fn id(&self) -> &str {
        &self.id
    }
}

/// What accounts without access get to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotPreview {
    pub id: String,
    pub trail_id: String,
}

/// A spot as returned through the access gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "access", content = "spot", rename_all = "lowercase")]
pub enum SpotView {
    Full(Spot),
    Preview(SpotPreview),
}

impl SpotView {
    pub fn id(&self) -> &str {
        match self {
            Self::Full(spot) => &spot.id,
            Self::Preview(preview) => &preview.id,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}
