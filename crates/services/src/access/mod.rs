//! # Access-Control Composites
//!
//! Cross-domain reads. The spot and discovery domains never import each
//! other; these composites bridge their public contracts.

pub mod gate;
mod spots;
mod state;

pub use gate::{GateMode, SpotAccess};
pub use spots::{AccessibleSpotsOptions, SpotAccessComposite};
pub use state::DiscoveryStateComposite;
