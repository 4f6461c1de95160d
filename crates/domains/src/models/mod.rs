//! # Domain Models
//!
//! These structs represent the core entities of the discovery game.
//! Field names serialize as camelCase, which is also the vocabulary
//! store queries filter on.

mod account;
mod discovery;
mod spot;
mod trail;

pub use account::{AccountContext, ClientKind, Role};
pub use discovery::{
    Clue, ClueSource, Discovery, DiscoveryLocationRecord, DiscoveryProfile, DiscoveryProfilePatch,
    DiscoverySnap, DiscoveryState, DiscoveryTrail, ScanEvent, TrailProgress,
};
pub use spot::{Spot, SpotOptions, SpotPreview, SpotView, SpotVisibility};
pub use trail::{DiscoveryMode, PreviewMode, Trail, TrailOptions, TrailRegion};
