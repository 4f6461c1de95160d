//! # Discovery Domain Service
//!
//! Pure functions deciding what an account discovers, which clues it may
//! see and how close it is to the next spot. Every function takes the data
//! it needs as arguments and never touches a store; the application layer
//! persists whatever comes back.
//!
//! Nothing here fails. Unknown spot ids are skipped and "nothing to do"
//! is an empty collection or `None`.

use std::collections::HashSet;

use chrono::Utc;
use domains::geo::{self, GeoLocation, LocationWithDirection};
use domains::models::{
    Clue, ClueSource, Discovery, DiscoveryLocationRecord, DiscoveryMode, DiscoverySnap,
    DiscoveryTrail, PreviewMode, ScanEvent, Spot, Trail, TrailProgress,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Map radius used to filter clues when a trail has no region.
pub const DEFAULT_MAP_RADIUS_METERS: f64 = 5_000.0;

/// Separates id parts before hashing so `("ab", "c")` and `("a", "bc")` differ.
const ID_PART_SEPARATOR: u8 = 0x1f;

/// Deterministic discovery id: SHA-256 over the sorted id parts.
///
/// The same `(account, spot, trail)` tuple always yields the same id, and
/// a trail-scoped id never equals the unscoped one.
pub fn create_discovery_id(account_id: &str, spot_id: &str, trail_id: Option<&str>) -> String {
    let mut parts = vec![account_id, spot_id];
    parts.extend(trail_id);
    parts.sort_unstable();

    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([ID_PART_SEPARATOR]);
    }
    hex::encode(hasher.finalize())
}

/// Builds a fresh discovery record stamped with the current time.
pub fn create_discovery(
    account_id: &str,
    spot_id: &str,
    trail_id: Option<&str>,
    scan_event_id: Option<&str>,
) -> Discovery {
    let now = Utc::now();
    Discovery {
        id: create_discovery_id(account_id, spot_id, trail_id),
        account_id: account_id.to_string(),
        spot_id: spot_id.to_string(),
        trail_id: trail_id.map(str::to_string),
        discovered_at: now,
        scan_event_id: scan_event_id.map(str::to_string),
        created_at: now,
        updated_at: now,
    }
}

/// Spot ids the account has discovered.
pub fn discovered_spot_ids<'a>(account_id: &str, discoveries: &'a [Discovery]) -> HashSet<&'a str> {
    discoveries
        .iter()
        .filter(|d| d.account_id == account_id)
        .map(|d| d.spot_id.as_str())
        .collect()
}

fn spots_in_trail_order<'a>(trail: &Trail, spots: &'a [Spot]) -> Vec<&'a Spot> {
    trail
        .spot_ids
        .iter()
        .filter_map(|id| spots.iter().find(|s| &s.id == id))
        .collect()
}

/// Spots eligible as discovery targets.
///
/// Free mode: every spot. Sequence mode: the undiscovered spots in trail
/// order, so the first entry is the next expected spot.
pub fn resolve_targets<'a>(
    account_id: &str,
    trail: &Trail,
    discoveries: &[Discovery],
    spots: &'a [Spot],
) -> Vec<&'a Spot> {
    match trail.options.discovery_mode {
        DiscoveryMode::Free => spots.iter().collect(),
        DiscoveryMode::Sequence => {
            let discovered = discovered_spot_ids(account_id, discoveries);
            spots_in_trail_order(trail, spots)
                .into_iter()
                .filter(|s| !discovered.contains(s.id.as_str()))
                .collect()
        }
    }
}

/// Undiscovered spots within their discovery radius of `position`.
///
/// The radius comparison is inclusive. In sequence mode only the next
/// expected spot is admissible.
pub fn resolve_new_discoveries(
    account_id: &str,
    position: &GeoLocation,
    spots: &[Spot],
    discoveries: &[Discovery],
    trail: &Trail,
) -> Vec<Discovery> {
    let discovered = discovered_spot_ids(account_id, discoveries);
    let targets = resolve_targets(account_id, trail, discoveries, spots);
    let admissible = match trail.options.discovery_mode {
        DiscoveryMode::Free => targets.len(),
        DiscoveryMode::Sequence => 1,
    };

    targets
        .into_iter()
        .filter(|spot| !discovered.contains(spot.id.as_str()))
        .take(admissible)
        .filter(|spot| geo::distance(position, &spot.location) <= spot.options.discovery_radius)
        .map(|spot| create_discovery(account_id, &spot.id, Some(&trail.id), None))
        .collect()
}

/// Turns a scan into discoveries.
///
/// `None` when the scan failed or found no clues. Free mode discovers
/// every scanned trail spot not yet known; sequence mode discovers only
/// the next expected spot, and only if it was scanned. Trail entries
/// without a spot record are skipped, as on the location path.
pub fn resolve_scan_event(
    scan_event: &ScanEvent,
    trail: &Trail,
    discoveries: &[Discovery],
    spots: &[Spot],
) -> Option<Vec<Discovery>> {
    if !scan_event.successful || scan_event.clues.is_empty() {
        return None;
    }

    let account_id = scan_event.account_id.as_str();
    let discovered = discovered_spot_ids(account_id, discoveries);
    let scanned: HashSet<&str> = scan_event
        .clues
        .iter()
        .map(|clue| clue.spot_id.as_str())
        .collect();
    let discover = |spot: &Spot| {
        create_discovery(account_id, &spot.id, Some(&trail.id), Some(&scan_event.id))
    };

    let found: Vec<Discovery> = match trail.options.discovery_mode {
        DiscoveryMode::Free => spots_in_trail_order(trail, spots)
            .into_iter()
            .filter(|spot| {
                scanned.contains(spot.id.as_str()) && !discovered.contains(spot.id.as_str())
            })
            .map(discover)
            .collect(),
        DiscoveryMode::Sequence => resolve_targets(account_id, trail, discoveries, spots)
            .first()
            .filter(|next| scanned.contains(next.id.as_str()))
            .map(|next| vec![discover(*next)])
            .unwrap_or_default(),
    };
    Some(found)
}

fn discovered_trail_spots(account_id: &str, trail: &Trail, discoveries: &[Discovery]) -> usize {
    let discovered = discovered_spot_ids(account_id, discoveries);
    trail
        .spot_ids
        .iter()
        .filter(|id| discovered.contains(id.as_str()))
        .count()
}

/// Rounded share of the trail's spots the account has discovered. 0 for an empty trail.
pub fn trail_completion_percentage(account_id: &str, trail: &Trail, discoveries: &[Discovery]) -> u8 {
    let total = trail.spot_ids.len();
    if total == 0 {
        return 0;
    }
    let discovered = discovered_trail_spots(account_id, trail, discoveries);
    (discovered as f64 / total as f64 * 100.0).round() as u8
}

pub fn is_trail_completed(account_id: &str, trail: &Trail, discoveries: &[Discovery]) -> bool {
    let discovered = discovered_spot_ids(account_id, discoveries);
    trail
        .spot_ids
        .iter()
        .all(|id| discovered.contains(id.as_str()))
}

pub fn trail_progress(account_id: &str, trail: &Trail, discoveries: &[Discovery]) -> TrailProgress {
    TrailProgress {
        discovered: discovered_trail_spots(account_id, trail, discoveries),
        total: trail.spot_ids.len(),
        percentage: trail_completion_percentage(account_id, trail, discoveries),
        completed: is_trail_completed(account_id, trail, discoveries),
    }
}

fn clue_id(trail_id: &str, spot_id: &str, source: ClueSource) -> String {
    let name = format!("{trail_id}/{spot_id}/{source:?}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// One preview clue per undiscovered trail spot, when the trail allows previews.
pub fn resolve_clues(
    account_id: &str,
    trail: &Trail,
    discoveries: &[Discovery],
    spots: &[Spot],
) -> Vec<Clue> {
    match trail.options.preview_mode {
        PreviewMode::Hidden => Vec::new(),
        PreviewMode::Preview => {
            let discovered = discovered_spot_ids(account_id, discoveries);
            spots_in_trail_order(trail, spots)
                .into_iter()
                .filter(|spot| !discovered.contains(spot.id.as_str()))
                .map(|spot| Clue {
                    id: clue_id(&trail.id, &spot.id, ClueSource::Preview),
                    spot_id: spot.id.clone(),
                    trail_id: trail.id.clone(),
                    location: spot.location,
                    radius: spot.options.clue_radius,
                    source: ClueSource::Preview,
                })
                .collect()
        }
    }
}

/// Proximity feedback toward the nearest unexplored spot.
///
/// - `None`: every spot is explored, nothing left to find.
/// - `Some(NOTHING_IN_RANGE)`: a max range is set and no unexplored spot is within it.
/// - otherwise intensity falls linearly from 1 at the spot to 0 at the max range.
///
/// Without a max range there is no falloff: intensity is 1 on the spot, 0 elsewhere.
pub fn resolve_snap(
    position: &GeoLocation,
    spots: &[Spot],
    explored_spot_ids: &HashSet<&str>,
    max_range_meters: Option<f64>,
) -> Option<DiscoverySnap> {
    let nearest = spots
        .iter()
        .filter(|spot| !explored_spot_ids.contains(spot.id.as_str()))
        .map(|spot| geo::distance(position, &spot.location))
        .min_by(f64::total_cmp)?;

    match max_range_meters.filter(|range| *range > 0.0) {
        Some(range) if nearest > range => Some(DiscoverySnap::NOTHING_IN_RANGE),
        Some(range) => Some(DiscoverySnap {
            distance: nearest,
            intensity: (1.0 - nearest / range).clamp(0.0, 1.0),
        }),
        None => Some(DiscoverySnap {
            distance: nearest,
            intensity: if nearest == 0.0 { 1.0 } else { 0.0 },
        }),
    }
}

/// Handles one location fix: new discoveries plus a snap toward the next
/// spot. Spots discovered by this very fix are excluded from the snap.
pub fn process_location_update(
    account_id: &str,
    location_with_direction: &LocationWithDirection,
    discoveries: &[Discovery],
    spots: &[Spot],
    trail: &Trail,
) -> DiscoveryLocationRecord {
    let position = &location_with_direction.location;
    let new_discoveries = resolve_new_discoveries(account_id, position, spots, discoveries, trail);

    let mut explored = discovered_spot_ids(account_id, discoveries);
    explored.extend(new_discoveries.iter().map(|d| d.spot_id.as_str()));
    let snap = resolve_snap(position, spots, &explored, trail.options.snap_radius);

    DiscoveryLocationRecord {
        location_with_direction: *location_with_direction,
        created_at: Utc::now(),
        discoveries: new_discoveries,
        snap,
    }
}

/// Assembles the account's view of a trail.
///
/// With a user location, preview clues are limited to the trail's region,
/// or to a `fallback_radius_meters` box around the user when the trail has none.
pub fn build_discovery_trail(
    account_id: &str,
    trail: &Trail,
    discoveries: &[Discovery],
    spots: &[Spot],
    user_location: Option<&GeoLocation>,
    fallback_radius_meters: f64,
) -> DiscoveryTrail {
    let discovered = discovered_spot_ids(account_id, discoveries);
    let trail_spots: HashSet<&str> = trail.spot_ids.iter().map(String::as_str).collect();

    let discovered_spots = spots_in_trail_order(trail, spots)
        .into_iter()
        .filter(|spot| discovered.contains(spot.id.as_str()))
        .cloned()
        .collect();

    let mut preview_clues = resolve_clues(account_id, trail, discoveries, spots);
    if let Some(user) = user_location {
        let boundary = match &trail.region {
            Some(region) => geo::boundary_from_radius(&region.center, region.radius_km * 1_000.0),
            None => geo::boundary_from_radius(user, fallback_radius_meters),
        };
        preview_clues.retain(|clue| geo::in_bounds(&clue.location, &boundary));
    }

    let trail_discoveries = discoveries
        .iter()
        .filter(|d| d.account_id == account_id)
        .filter(|d| match &d.trail_id {
            Some(trail_id) => trail_id == &trail.id,
            None => trail_spots.contains(d.spot_id.as_str()),
        })
        .cloned()
        .collect();

    DiscoveryTrail {
        trail: trail.clone(),
        spots: discovered_spots,
        preview_clues,
        discoveries: trail_discoveries,
        progress: trail_progress(account_id, trail, discoveries),
    }
}
