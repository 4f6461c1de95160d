//! # domains
//!
//! Entities, geospatial primitives, error taxonomy and port traits for
//! the discovery engine. No I/O lives here; adapters implement the ports.

pub mod error;
pub mod geo;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use error::*;
pub use geo::{GeoBoundary, GeoLocation, LocationWithDirection};
pub use models::*;
pub use ports::*;
