use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::geo::{GeoLocation, LocationWithDirection};
use crate::models::{Spot, Trail};
use crate::ports::Entity;

/// The durable record that an account has found a spot.
/// The id is derived from `(account_id, spot_id, trail_id)`, so
/// re-deriving the same discovery always lands on the same row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discovery {
    pub id: String,
    pub account_id: String,
    pub spot_id: String,
    #[serde(default)]
    pub trail_id: Option<String>,
    pub discovered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Discovery {
    const COLLECTION: &'static str = "discoveries";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Per-account discovery preferences, keyed by account id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryProfile {
    pub id: String,
    pub account_id: String,
    #[serde(default)]
    pub last_active_trail_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiscoveryProfile {
    pub fn new(account_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: account_id.to_string(),
            account_id: account_id.to_string(),
            last_active_trail_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for DiscoveryProfile {
    const COLLECTION: &'static str = "discovery_profiles";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Fields a caller may change on a profile. The outer `None` leaves a
/// field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryProfilePatch {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub last_active_trail_id: Option<Option<String>>,
}

impl DiscoveryProfilePatch {
    pub fn activate(trail_id: impl Into<String>) -> Self {
        Self {
            last_active_trail_id: Some(Some(trail_id.into())),
        }
    }

    pub fn deactivate() -> Self {
        Self {
            last_active_trail_id: Some(None),
        }
    }
}

/// A field that is present, even as `null`, deserializes to `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClueSource {
    Preview,
    ScanEvent,
}

/// A location-only hint for a spot. Never carries name or description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clue {
    pub id: String,
    pub spot_id: String,
    pub trail_id: String,
    pub location: GeoLocation,
    pub radius: f64,
    pub source: ClueSource,
}

/// Output of the external scanner subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    pub id: String,
    pub account_id: String,
    pub trail_id: String,
    pub successful: bool,
    #[serde(default)]
    pub clues: Vec<Clue>,
    pub created_at: DateTime<Utc>,
}

/// Proximity feedback toward the nearest unexplored spot. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySnap {
    /// Meters to the nearest unexplored spot
    pub distance: f64,
    /// 1.0 on top of the spot, 0.0 at or beyond the snap range
    pub intensity: f64,
}

impl DiscoverySnap {
    /// Unexplored spots exist, but none within range.
    pub const NOTHING_IN_RANGE: Self = Self {
        distance: 0.0,
        intensity: 0.0,
    };
}

/// Result of processing a single location update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryLocationRecord {
    pub location_with_direction: LocationWithDirection,
    pub created_at: DateTime<Utc>,
    pub discoveries: Vec<Discovery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snap: Option<DiscoverySnap>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailProgress {
    pub discovered: usize,
    pub total: usize,
    pub percentage: u8,
    pub completed: bool,
}

/// Per-account view of one trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryTrail {
    pub trail: Trail,
    /// Spots of this trail the account has discovered, in trail order
    pub spots: Vec<Spot>,
    pub preview_clues: Vec<Clue>,
    pub discoveries: Vec<Discovery>,
    pub progress: TrailProgress,
}

/// Everything the app needs on launch, in one read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryState {
    pub profile: DiscoveryProfile,
    pub discoveries: Vec<Discovery>,
    pub spots: Vec<Spot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trail: Option<DiscoveryTrail>,
}
