//! # Geospatial Primitives
//!
//! Distance, bearing and bounding-box helpers on a spherical Earth.
//! Pure functions with no failure modes; degenerate inputs (identical
//! points, poles) follow plain IEEE-754 behavior.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the Haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Approximate length of one degree of latitude.
pub const METERS_PER_DEGREE_LAT: f64 = 111_000.0;

/// Two fixes closer than this are treated as the same position.
pub const LOCATION_EPSILON_METERS: f64 = 0.1;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
}

impl GeoLocation {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both coordinates are finite and within WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Axis-aligned lat/lon box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoBoundary {
    pub north_east: GeoLocation,
    pub south_west: GeoLocation,
}

/// 8-point compass direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardinalDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CardinalDirection {
    const ORDER: [CardinalDirection; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    /// Maps a bearing in degrees onto 45° sectors centred on each direction.
    pub fn from_bearing(degrees: f64) -> Self {
        let normalized = degrees.rem_euclid(360.0);
        let sector = ((normalized + 22.5) / 45.0).floor() as usize % 8;
        Self::ORDER[sector]
    }
}

/// A position fix, optionally annotated with the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationWithDirection {
    pub location: GeoLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<CardinalDirection>,
}

impl LocationWithDirection {
    pub fn at(location: GeoLocation) -> Self {
        Self {
            location,
            heading: None,
            direction: None,
        }
    }

    /// Fix at `to`, heading derived from the movement `from -> to`.
    /// Stationary movement leaves the heading unset.
    pub fn between(from: GeoLocation, to: GeoLocation) -> Self {
        if distance(&from, &to) < LOCATION_EPSILON_METERS {
            return Self::at(to);
        }
        let heading = bearing(&from, &to);
        Self {
            location: to,
            heading: Some(heading),
            direction: Some(CardinalDirection::from_bearing(heading)),
        }
    }
}

/// Great-circle distance in meters (Haversine).
pub fn distance(a: &GeoLocation, b: &GeoLocation) -> f64 {
    let lat1_rad = a.lat.to_radians();
    let lat2_rad = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Initial bearing from `a` to `b` in degrees, normalized to [0, 360).
pub fn bearing(a: &GeoLocation, b: &GeoLocation) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Square-ish box around `center` spanning `radius_meters` in each direction.
pub fn boundary_from_radius(center: &GeoLocation, radius_meters: f64) -> GeoBoundary {
    let lat_delta = radius_meters / METERS_PER_DEGREE_LAT;
    let lon_delta = radius_meters / (METERS_PER_DEGREE_LAT * center.lat.to_radians().cos());

    GeoBoundary {
        north_east: GeoLocation::new(center.lat + lat_delta, center.lon + lon_delta),
        south_west: GeoLocation::new(center.lat - lat_delta, center.lon - lon_delta),
    }
}

/// Inclusive rectangular containment.
pub fn in_bounds(point: &GeoLocation, boundary: &GeoBoundary) -> bool {
    point.lat <= boundary.north_east.lat
        && point.lat >= boundary.south_west.lat
        && point.lon <= boundary.north_east.lon
        && point.lon >= boundary.south_west.lon
}
