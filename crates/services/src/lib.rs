//! # services
//!
//! The discovery engine: pure discovery rules, the account-facing
//! discovery application, and the composites that gate spot reads on
//! discovery state. All persistence goes through the ports in `domains`.

pub mod access;
pub mod catalog;
pub mod discovery;

pub use access::{
    AccessibleSpotsOptions, DiscoveryStateComposite, GateMode, SpotAccess, SpotAccessComposite,
};
pub use catalog::{StoreSpotCatalog, StoreTrailCatalog};
pub use discovery::{DiscoveryApplication, DiscoverySettings};

#[cfg(test)]
pub(crate) mod fixtures;
